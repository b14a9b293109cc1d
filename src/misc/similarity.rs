//! Fuzzy string matching, used to look up audio devices by a partial name.

use hashbrown::HashMap;

pub trait Similarity {
    fn similarity(&self, other: &Self) -> f64;
}

impl<T: AsRef<str>> Similarity for T {
    fn similarity(&self, other: &Self) -> f64 {
        similarity(self.as_ref(), other.as_ref())
    }
}

/// Dice coefficient of the character bigrams of both strings, ignoring spaces.
/// 1.0 for identical strings, 0.0 when nothing is shared.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.chars().filter(|x| *x != ' ').collect::<Vec<_>>();
    let b = b.chars().filter(|x| *x != ' ').collect::<Vec<_>>();

    if a == b {
        return 1.0;
    }

    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams = HashMap::<(char, char), usize>::new();
    for i in a.windows(2) {
        *bigrams.entry((i[0], i[1])).or_default() += 1;
    }

    let mut shared = 0;
    for i in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(i[0], i[1])).filter(|x| **x > 0) {
            *count -= 1;
            shared += 1;
        }
    }

    (2 * shared) as f64 / (a.len() + b.len() - 2) as f64
}

#[cfg(test)]
mod test {
    use super::{similarity, Similarity};

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("pulse", "pulse"), 1.0);
        assert_eq!(similarity("Built in", "Builtin"), 1.0);
        assert_eq!(similarity("a", "abc"), 0.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
    }

    #[test]
    fn test_similarity_ranking() {
        let wanted = "usb headset";
        let close = "usb audio headset".similarity(&wanted);
        let far = "hdmi output".similarity(&wanted);
        assert!(close > far);
        assert!((0.0..=1.0).contains(&close));
    }
}
