//! Matching predicate used to validate claims and detect the end of a game.

use std::collections::HashSet;

use super::{
    constants::{DEFAULT_FEATURE_COUNT, DEFAULT_FEATURE_SIZE, SET_SIZE},
    entities::Card,
};

/// Decides which triples of cards form a set.
///
/// The arbiter and the turn clock only ever talk to this trait, so any
/// card model can be plugged in.
pub trait MatchPredicate: Send + Sync {
    fn is_match(&self, a: Card, b: Card, c: Card) -> bool;

    /// Up to `limit` matching triples drawn from `cards`, in scan order.
    fn find_matches(&self, cards: &[Card], limit: usize) -> Vec<[Card; SET_SIZE]> {
        scan_triples(self, cards, limit)
    }

    fn find_any_match(&self, cards: &[Card]) -> Option<[Card; SET_SIZE]> {
        self.find_matches(cards, 1).into_iter().next()
    }

    /// Human-readable features of a card, used for hints.
    fn features(&self, _card: Card) -> Vec<usize> {
        Vec::new()
    }
}

/// Check every triple of `cards` in scan order.
fn scan_triples<P>(predicate: &P, cards: &[Card], limit: usize) -> Vec<[Card; SET_SIZE]>
where
    P: MatchPredicate + ?Sized,
{
    let mut matches = Vec::new();
    if limit == 0 {
        return matches;
    }
    for i in 0..cards.len() {
        for j in i + 1..cards.len() {
            for k in j + 1..cards.len() {
                if predicate.is_match(cards[i], cards[j], cards[k]) {
                    matches.push([cards[i], cards[j], cards[k]]);
                    if matches.len() == limit {
                        return matches;
                    }
                }
            }
        }
    }
    matches
}

/// The classic feature-vector rule: a card id encodes `feature_count`
/// digits in base `feature_size`, and three cards match iff every feature
/// is either the same on all three or different on all three.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureMatcher {
    feature_size: usize,
    feature_count: usize,
}

impl FeatureMatcher {
    #[must_use]
    pub fn new(feature_size: usize, feature_count: usize) -> Self {
        Self {
            feature_size,
            feature_count,
        }
    }

    pub fn deck_size(&self) -> usize {
        self.feature_size.pow(self.feature_count as u32)
    }

    /// Decompose a card id into its feature digits, least significant first.
    pub fn card_to_features(&self, card: Card) -> Vec<usize> {
        let mut rest = card;
        (0..self.feature_count)
            .map(|_| {
                let digit = rest % self.feature_size;
                rest /= self.feature_size;
                digit
            })
            .collect()
    }

    fn features_to_card(&self, features: &[usize]) -> Card {
        features
            .iter()
            .rev()
            .fold(0, |card, digit| card * self.feature_size + digit)
    }

    /// With three values per feature, two cards determine the third.
    fn complement(&self, a: Card, b: Card) -> Card {
        let fa = self.card_to_features(a);
        let fb = self.card_to_features(b);
        let fc: Vec<usize> = fa
            .iter()
            .zip(&fb)
            .map(|(x, y)| (2 * SET_SIZE - x - y) % SET_SIZE)
            .collect();
        self.features_to_card(&fc)
    }
}

impl Default for FeatureMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_SIZE, DEFAULT_FEATURE_COUNT)
    }
}

impl MatchPredicate for FeatureMatcher {
    fn is_match(&self, a: Card, b: Card, c: Card) -> bool {
        if a == b || b == c || a == c {
            return false;
        }
        let (fa, fb, fc) = (
            self.card_to_features(a),
            self.card_to_features(b),
            self.card_to_features(c),
        );
        (0..self.feature_count).all(|i| {
            let all_same = fa[i] == fb[i] && fb[i] == fc[i];
            let all_different = fa[i] != fb[i] && fb[i] != fc[i] && fa[i] != fc[i];
            all_same || all_different
        })
    }

    fn find_matches(&self, cards: &[Card], limit: usize) -> Vec<[Card; SET_SIZE]> {
        let mut matches = Vec::new();
        if limit == 0 {
            return matches;
        }
        if self.feature_size != SET_SIZE {
            return scan_triples(self, cards, limit);
        }

        // Pair scan: the third card is fixed, so only look it up. Each triple
        // is reported once, from its two lowest-positioned cards.
        let position: std::collections::HashMap<Card, usize> = cards
            .iter()
            .enumerate()
            .map(|(idx, &card)| (card, idx))
            .collect();
        let mut seen = HashSet::new();
        for i in 0..cards.len() {
            for j in i + 1..cards.len() {
                let third = self.complement(cards[i], cards[j]);
                match position.get(&third) {
                    Some(&k) if k > j => {
                        let triple = [cards[i], cards[j], third];
                        if seen.insert(triple) {
                            matches.push(triple);
                            if matches.len() == limit {
                                return matches;
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        matches
    }

    fn features(&self, card: Card) -> Vec<usize> {
        self.card_to_features(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_to_features_base_three() {
        let matcher = FeatureMatcher::default();
        assert_eq!(matcher.card_to_features(0), vec![0, 0, 0, 0]);
        assert_eq!(matcher.card_to_features(1), vec![1, 0, 0, 0]);
        assert_eq!(matcher.card_to_features(5), vec![2, 1, 0, 0]);
        assert_eq!(matcher.card_to_features(80), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_features_roundtrip() {
        let matcher = FeatureMatcher::default();
        for card in 0..matcher.deck_size() {
            let features = matcher.card_to_features(card);
            assert_eq!(matcher.features_to_card(&features), card);
        }
    }

    #[test]
    fn test_all_different_is_match() {
        let matcher = FeatureMatcher::default();
        // features: [0,0,0,0], [1,1,1,1], [2,2,2,2]
        assert!(matcher.is_match(0, 40, 80));
    }

    #[test]
    fn test_one_feature_same_rest_different() {
        let matcher = FeatureMatcher::default();
        // [0,0,0,0], [1,0,0,0], [2,0,0,0]
        assert!(matcher.is_match(0, 1, 2));
    }

    #[test]
    fn test_two_same_one_different_is_not_match() {
        let matcher = FeatureMatcher::default();
        // [0,0,0,0], [0,1,0,0], [1,0,0,0]: first feature is 0,0,1
        assert!(!matcher.is_match(0, 3, 1));
    }

    #[test]
    fn test_duplicate_cards_never_match() {
        let matcher = FeatureMatcher::default();
        assert!(!matcher.is_match(7, 7, 7));
        assert!(!matcher.is_match(1, 1, 2));
    }

    #[test]
    fn test_complement_completes_pair() {
        let matcher = FeatureMatcher::default();
        for a in 0..matcher.deck_size() {
            for b in (a + 1)..matcher.deck_size() {
                let c = matcher.complement(a, b);
                assert!(matcher.is_match(a, b, c), "{a} {b} {c}");
            }
        }
    }

    #[test]
    fn test_pair_scan_agrees_with_triple_scan() {
        let matcher = FeatureMatcher::default();
        let cards: Vec<Card> = (0..20).collect();
        let mut found = matcher.find_matches(&cards, usize::MAX);
        let mut expected = scan_triples(&matcher, &cards, usize::MAX);
        found.sort_unstable();
        expected.sort_unstable();
        assert!(!expected.is_empty());
        assert_eq!(found, expected);
    }

    #[test]
    fn test_wider_features_use_triple_scan() {
        let matcher = FeatureMatcher::new(4, 2);
        let cards: Vec<Card> = (0..16).collect();
        assert_eq!(
            matcher.find_matches(&cards, usize::MAX),
            scan_triples(&matcher, &cards, usize::MAX)
        );
        assert_eq!(matcher.find_matches(&cards, 2).len(), 2);
        assert!(matcher.find_matches(&cards, 0).is_empty());
    }

    #[test]
    fn test_find_any_match_none_when_no_set() {
        let matcher = FeatureMatcher::default();
        // 0=[0,0,0,0], 1=[1,0,0,0], 3=[0,1,0,0], 4=[1,1,0,0]: no triple is a set
        assert_eq!(matcher.find_any_match(&[0, 1, 3, 4]), None);
        assert_eq!(matcher.find_any_match(&[0, 1]), None);
    }

    #[test]
    fn test_find_matches_respects_limit() {
        let matcher = FeatureMatcher::default();
        let deck: Vec<Card> = (0..81).collect();
        assert_eq!(matcher.find_matches(&deck, 5).len(), 5);
        assert!(matcher.find_matches(&deck, 0).is_empty());
        // The full deck holds 81 * 80 / 6 sets.
        assert_eq!(matcher.find_matches(&deck, usize::MAX).len(), 1080);
    }

    #[test]
    fn test_generic_feature_size() {
        let matcher = FeatureMatcher::new(4, 2);
        assert_eq!(matcher.deck_size(), 16);
        // [0,0] [1,0] [2,0]: first all different, second all same
        assert!(matcher.is_match(0, 1, 2));
        // [0,0] [1,0] [1,1]
        assert!(!matcher.is_match(0, 1, 5));
        assert!(!matcher.find_matches(&(0..16).collect::<Vec<_>>(), 3).is_empty());
    }
}
