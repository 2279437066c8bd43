/// Display name for the organoid at `ordinal` among the accepted organoids.
///
/// One letter, repeated once per pass through the alphabet:
/// A..Z, then AA, BB, .. ZZ, then AAA, BBB, ..
pub fn organoid_label(ordinal: usize) -> String {
    let letter = (b'A' + (ordinal % 26) as u8) as char;
    let repeat = ordinal / 26 + 1;
    std::iter::repeat(letter).take(repeat).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn known_labels() {
        assert_eq!(organoid_label(0), "A");
        assert_eq!(organoid_label(1), "B");
        assert_eq!(organoid_label(25), "Z");
        assert_eq!(organoid_label(26), "AA");
        assert_eq!(organoid_label(27), "BB");
        assert_eq!(organoid_label(51), "ZZ");
        assert_eq!(organoid_label(52), "AAA");
    }

    #[test]
    fn first_hundred_labels_are_unique() {
        let labels: HashSet<String> = (0..100).map(organoid_label).collect();
        assert_eq!(labels.len(), 100);
    }

    #[test]
    fn length_is_ceiling_of_pass_count() {
        for ordinal in 0..100usize {
            let expected = ((ordinal + 1) as f64 / 26.0).ceil() as usize;
            assert_eq!(organoid_label(ordinal).len(), expected, "ordinal {}", ordinal);
        }
    }
}
