//! Probabilistic existence filters
//!
//! Double-hashing Bloom filter over SHA-256: two 64-bit hashes from one
//! digest drive k probe positions (`h1 + i * h2 mod m`). False positives
//! are tolerated and re-checked against the real adjacency; false
//! negatives never occur.

use sha2::{Digest, Sha256};

pub struct BloomFilter {
    bits: Vec<u64>,
    size_bits: u64,
    hash_count: u32,
    count: u64,
    expected: usize,
    fpr: f64,
}

impl BloomFilter {
    pub fn new(expected_elements: usize, fpr: f64) -> Self {
        let expected = expected_elements.max(1);
        let fpr = fpr.clamp(1e-9, 0.5);
        let size_bits = Self::optimal_size(expected, fpr);
        let hash_count = Self::optimal_hash_count(size_bits, expected);
        Self {
            bits: vec![0u64; ((size_bits + 63) / 64) as usize],
            size_bits,
            hash_count,
            count: 0,
            expected,
            fpr,
        }
    }

    /// m = -n·ln(p) / ln(2)², minimum 64 bits.
    fn optimal_size(n: usize, p: f64) -> u64 {
        let m = -(n as f64) * p.ln() / (std::f64::consts::LN_2 * std::f64::consts::LN_2);
        (m.ceil() as u64).max(64)
    }

    /// k = (m/n)·ln(2), clamped to 1..=10.
    fn optimal_hash_count(m: u64, n: usize) -> u32 {
        let k = (m as f64 / n as f64) * std::f64::consts::LN_2;
        (k.round() as u32).clamp(1, 10)
    }

    fn probe_positions(&self, item: &str) -> impl Iterator<Item = u64> + '_ {
        let digest = Sha256::digest(item.as_bytes());
        let h1 = u64::from_be_bytes(digest[0..8].try_into().unwrap());
        let h2 = u64::from_be_bytes(digest[8..16].try_into().unwrap());
        let size = self.size_bits;
        (0..self.hash_count as u64).map(move |i| (h1.wrapping_add(i.wrapping_mul(h2))) % size)
    }

    pub fn add(&mut self, item: &str) {
        let positions: Vec<u64> = self.probe_positions(item).collect();
        for pos in positions {
            self.bits[(pos / 64) as usize] |= 1 << (pos % 64);
        }
        self.count += 1;
    }

    pub fn might_contain(&self, item: &str) -> bool {
        self.probe_positions(item)
            .all(|pos| self.bits[(pos / 64) as usize] & (1 << (pos % 64)) != 0)
    }

    pub fn definitely_not_contains(&self, item: &str) -> bool {
        !self.might_contain(item)
    }

    pub fn clear(&mut self) {
        self.bits.fill(0);
        self.count = 0;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// (1 − e^(−kn/m))^k
    pub fn estimated_fpr(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let exponent = -(self.hash_count as f64) * self.count as f64 / self.size_bits as f64;
        (1.0 - exponent.exp()).powi(self.hash_count as i32)
    }

    pub fn target_fpr(&self) -> f64 {
        self.fpr
    }

    pub fn expected_elements(&self) -> usize {
        self.expected
    }
}

/// Negative existence check for edges `from→to` at ~1% FPR.
pub struct EdgeBloomFilter {
    filter: BloomFilter,
}

impl EdgeBloomFilter {
    pub fn new(expected_edges: usize) -> Self {
        Self {
            filter: BloomFilter::new(expected_edges, 0.01),
        }
    }

    fn encode(from_node: &str, to_node: &str) -> String {
        format!("{}\u{2192}{}", from_node, to_node)
    }

    pub fn add_edge(&mut self, from_node: &str, to_node: &str) {
        self.filter.add(&Self::encode(from_node, to_node));
    }

    pub fn might_have_edge(&self, from_node: &str, to_node: &str) -> bool {
        self.filter.might_contain(&Self::encode(from_node, to_node))
    }

    pub fn definitely_no_edge(&self, from_node: &str, to_node: &str) -> bool {
        !self.might_have_edge(from_node, to_node)
    }
}

/// Fronts negative reachability queries at ~0.1% FPR; false positives only
/// cost a wasted path search.
pub struct ReachabilityBloomFilter {
    filter: BloomFilter,
}

impl ReachabilityBloomFilter {
    pub fn new(expected_pairs: usize) -> Self {
        Self {
            filter: BloomFilter::new(expected_pairs, 0.001),
        }
    }

    fn encode(source: &str, target: &str) -> String {
        format!("{}\u{21dd}{}", source, target)
    }

    pub fn add_reachable(&mut self, source: &str, target: &str) {
        self.filter.add(&Self::encode(source, target));
    }

    pub fn might_reach(&self, source: &str, target: &str) -> bool {
        self.filter.might_contain(&Self::encode(source, target))
    }

    pub fn definitely_unreachable(&self, source: &str, target: &str) -> bool {
        !self.might_reach(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_false_negatives() {
        let mut filter = BloomFilter::new(1000, 0.01);
        for i in 0..1000 {
            filter.add(&format!("node:{}", i));
        }
        for i in 0..1000 {
            assert!(filter.might_contain(&format!("node:{}", i)));
        }
    }

    #[test]
    fn test_fpr_stays_reasonable() {
        let mut filter = BloomFilter::new(1000, 0.01);
        for i in 0..1000 {
            filter.add(&format!("node:{}", i));
        }
        let false_positives = (0..10_000)
            .filter(|i| filter.might_contain(&format!("absent:{}", i)))
            .count();
        // 1% target; allow generous slack for hash variance
        assert!(false_positives < 500, "fpr too high: {}", false_positives);
    }

    #[test]
    fn test_edge_filter_roundtrip() {
        let mut filter = EdgeBloomFilter::new(100);
        filter.add_edge("a", "b");
        assert!(filter.might_have_edge("a", "b"));
        assert!(filter.definitely_no_edge("b", "a") || filter.might_have_edge("b", "a"));
    }

    #[test]
    fn test_clear() {
        let mut filter = BloomFilter::new(10, 0.01);
        filter.add("x");
        filter.clear();
        assert_eq!(filter.count(), 0);
        assert!(!filter.might_contain("x"));
    }
}
