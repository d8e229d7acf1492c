//! Feature-flag vectors.
//!
//! A feature-flag sequence is a run of `i64` words in which every entry
//! but the last is negated; the reader keeps accumulating absolute values
//! until it sees a non-negative word. An empty logical set is written as
//! a single zero. Logical values are non-negative; the most significant
//! bit is reserved.

use sheaf_error::{sheaf_bail, SheafResult};

use crate::wire::{ReadCursor, WriteCursor};

/// Writes a feature-flag vector. Returns the byte count, `8 * max(1, n)`.
pub fn write_feature_flags(flags: &[i64], sink: &mut WriteCursor) -> SheafResult<usize> {
    if flags.is_empty() {
        sink.put_i64(0)?;
        return Ok(8);
    }
    for (i, &flag) in flags.iter().enumerate() {
        if flag < 0 {
            sheaf_bail!(InvalidFeatureFlag: "negative feature flag {flag}");
        }
        let last = i + 1 == flags.len();
        sink.put_i64(if last { flag } else { -flag })?;
    }
    Ok(flags.len() * 8)
}

/// Reads a feature-flag vector: accumulates entries until the first
/// non-negative one.
pub fn read_feature_flags(cursor: &mut ReadCursor) -> SheafResult<Vec<i64>> {
    let mut flags = Vec::new();
    loop {
        let raw = cursor.get_i64()?;
        let Some(flag) = raw.checked_abs() else {
            sheaf_bail!(InvalidFeatureFlag: "feature flag entry {raw:#018x} is not representable");
        };
        flags.push(flag);
        if raw >= 0 {
            return Ok(flags);
        }
    }
}

#[cfg(test)]
mod test {
    use sheaf_error::SheafError;

    use super::*;

    #[test]
    fn empty_set_is_a_single_zero() {
        let mut buf = [0xFFu8; 8];
        let written = write_feature_flags(&[], &mut WriteCursor::new(&mut buf)).unwrap();
        assert_eq!(written, 8);
        assert_eq!(buf, [0u8; 8]);
        assert_eq!(
            read_feature_flags(&mut ReadCursor::new(&buf)).unwrap(),
            vec![0]
        );
    }

    #[test]
    fn continuation_entries_are_negated() {
        let mut buf = [0u8; 16];
        let written = write_feature_flags(&[3, 7], &mut WriteCursor::new(&mut buf)).unwrap();
        assert_eq!(written, 16);

        let mut cursor = ReadCursor::new(&buf);
        assert_eq!(cursor.get_i64().unwrap(), -3);
        assert_eq!(cursor.get_i64().unwrap(), 7);

        assert_eq!(
            read_feature_flags(&mut ReadCursor::new(&buf)).unwrap(),
            vec![3, 7]
        );
    }

    #[test]
    fn single_flag_round_trip() {
        let mut buf = [0u8; 8];
        write_feature_flags(&[42], &mut WriteCursor::new(&mut buf)).unwrap();
        assert_eq!(
            read_feature_flags(&mut ReadCursor::new(&buf)).unwrap(),
            vec![42]
        );
    }

    #[test]
    fn negative_logical_flag_is_rejected() {
        let mut sizer = WriteCursor::sizer();
        assert!(matches!(
            write_feature_flags(&[1, -2, 3], &mut sizer),
            Err(SheafError::InvalidFeatureFlag(_))
        ));
    }

    #[test]
    fn unrepresentable_entry_is_rejected() {
        let mut buf = [0u8; 8];
        WriteCursor::new(&mut buf).put_i64(i64::MIN).unwrap();
        assert!(matches!(
            read_feature_flags(&mut ReadCursor::new(&buf)),
            Err(SheafError::InvalidFeatureFlag(_))
        ));
    }

    #[test]
    fn truncated_sequence_is_rejected() {
        // A continuation entry with nothing after it.
        let mut buf = [0u8; 8];
        WriteCursor::new(&mut buf).put_i64(-5).unwrap();
        assert!(matches!(
            read_feature_flags(&mut ReadCursor::new(&buf)),
            Err(SheafError::BufferTooShort(_))
        ));
    }
}
