//! Builds an optimal static Huffman code from a weight vector using the two-queue
//! method (one queue of leaves sorted by weight, one queue of internal nodes in creation
//! order, always merging the two lowest available weights across both), and compresses a
//! code-length sequence per RFC 1951 §3.2.7 (the 19-symbol code-length alphabet with run
//! codes 16/17/18).

/// Fixed reordering DEFLATE uses when transmitting the code-length alphabet's own code
/// lengths, so that trailing zero entries can usually be dropped.
pub const CLEN_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

#[derive(Clone, Copy)]
enum TreeChild {
    Leaf(usize),
    Internal(usize),
}

fn less(a: Option<u64>, b: Option<u64>) -> bool {
    match (a, b) {
        (Some(x), Some(y)) => x < y,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Computes one Huffman code length per symbol from a weight vector (weight 0 means the
/// symbol is unused and gets length 0). Lengths are not yet limited to any maximum; call
/// `canonical::limit_lengths` afterwards for alphabets with a hard cap (DEFLATE requires
/// at most 15 bits for the literal/length and distance alphabets, 7 for the code-length
/// alphabet).
pub fn code_lengths(weights: &[u32]) -> Vec<u8> {
    let n = weights.len();
    let mut lengths = vec![0u8; n];

    let mut leaves: Vec<(usize, u64)> = weights
        .iter()
        .enumerate()
        .filter(|&(_, &w)| w > 0)
        .map(|(i, &w)| (i, w as u64))
        .collect();
    if leaves.is_empty() {
        return lengths;
    }
    if leaves.len() == 1 {
        lengths[leaves[0].0] = 1;
        return lengths;
    }
    leaves.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let mut children: Vec<(TreeChild, TreeChild)> = Vec::new();
    let mut internal_weight: Vec<u64> = Vec::new();

    let mut h0 = 0usize;
    let mut h1 = 0usize;
    let mut building_weight = 0u64;
    let root: usize;

    loop {
        let p0 = leaves.get(h0).map(|&(_, w)| w);
        let p1 = internal_weight.get(h1).copied();

        let i0: TreeChild;
        let i1: TreeChild;
        if less(p0, p1) {
            let (val, w) = leaves[h0];
            building_weight += w;
            h0 += 1;
            i0 = TreeChild::Leaf(val);

            let p0b = leaves.get(h0).map(|&(_, w)| w);
            if less(p0b, p1) {
                let (val2, w2) = leaves[h0];
                building_weight += w2;
                h0 += 1;
                i1 = TreeChild::Leaf(val2);
            } else {
                let w = internal_weight[h1];
                building_weight += w;
                let idx = h1;
                h1 += 1;
                i1 = TreeChild::Internal(idx);
            }
        } else {
            let w0 = internal_weight[h1];
            building_weight += w0;
            let idx0 = h1;
            h1 += 1;

            let p1b = internal_weight.get(h1).copied();
            if less(p0, p1b) {
                let (val, w) = leaves[h0];
                building_weight += w;
                h0 += 1;
                i1 = TreeChild::Leaf(val);
                i0 = TreeChild::Internal(idx0);
            } else if p1b.is_none() {
                root = idx0;
                break;
            } else {
                let w1 = internal_weight[h1];
                building_weight += w1;
                let idx1 = h1;
                h1 += 1;
                i0 = TreeChild::Internal(idx0);
                i1 = TreeChild::Internal(idx1);
            }
        }

        children.push((i0, i1));
        internal_weight.push(building_weight);
        building_weight = 0;
    }

    assign_lengths(&children, TreeChild::Internal(root), 0, &mut lengths);
    lengths
}

fn assign_lengths(
    children: &[(TreeChild, TreeChild)],
    node: TreeChild,
    depth: u8,
    lengths: &mut [u8],
) {
    match node {
        TreeChild::Leaf(sym) => lengths[sym] = depth.max(1),
        TreeChild::Internal(idx) => {
            let (l, r) = children[idx];
            assign_lengths(children, l, depth + 1, lengths);
            assign_lengths(children, r, depth + 1, lengths);
        }
    }
}

/// One code-length-alphabet token: a literal length 0-15, or a run instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClenToken {
    /// Transmit this literal length directly.
    Literal(u8),
    /// Repeat the previous length 3-6 more times (code 16, 2 extra bits).
    RepeatPrev { count: u8 },
    /// Repeat a zero length 3-10 times (code 17, 3 extra bits).
    RepeatZeroShort { count: u8 },
    /// Repeat a zero length 11-138 times (code 18, 7 extra bits).
    RepeatZeroLong { count: u8 },
}

/// Computed HLIT/HDIST/HCLEN header fields for a dynamic block.
#[derive(Clone, Copy, Debug)]
pub struct BlockCounts {
    pub hlit: usize,
    pub hdist: usize,
    pub hclen: usize,
}

/// Greedily run-length-encodes the concatenation of a lit/len and a distance code-length
/// vector the way DEFLATE's dynamic block header does, accumulating frequencies for the
/// 19-symbol code-length alphabet as it goes (`clen_weights[sym] += 1` per emitted token).
/// Returns the token sequence and the corresponding `HLIT`/`HDIST` trim points; `HCLEN` is
/// derived separately once the code-length alphabet's own code has been built, by trimming
/// trailing zero entries from `CLEN_ORDER`.
pub fn encode_code_lengths(
    ll_lengths: &[u8],
    dist_lengths: &[u8],
    clen_weights: &mut [u32; 19],
) -> (Vec<ClenToken>, usize, usize) {
    let hlit = trim_trailing_zero_run(ll_lengths, 257);
    let hdist = trim_trailing_zero_run(dist_lengths, 1).max(1);

    let combined: Vec<u8> = ll_lengths[..hlit]
        .iter()
        .chain(dist_lengths[..hdist].iter())
        .copied()
        .collect();

    let mut tokens = Vec::new();
    let mut i = 0usize;
    while i < combined.len() {
        let d = combined[i];
        let mut j = i + 1;
        while j < combined.len() && combined[j] == d {
            j += 1;
        }
        let mut run = j - i;
        if d == 0 {
            while run >= 11 {
                let count = run.min(138);
                tokens.push(ClenToken::RepeatZeroLong { count: count as u8 });
                clen_weights[18] += 1;
                run -= count;
            }
            if run >= 3 {
                tokens.push(ClenToken::RepeatZeroShort { count: run as u8 });
                clen_weights[17] += 1;
                run = 0;
            }
            for _ in 0..run {
                tokens.push(ClenToken::Literal(0));
                clen_weights[0] += 1;
            }
        } else {
            tokens.push(ClenToken::Literal(d));
            clen_weights[d as usize] += 1;
            run -= 1;
            while run >= 3 {
                let count = run.min(6);
                tokens.push(ClenToken::RepeatPrev { count: count as u8 });
                clen_weights[16] += 1;
                run -= count;
            }
            for _ in 0..run {
                tokens.push(ClenToken::Literal(d));
                clen_weights[d as usize] += 1;
            }
        }
        i = j;
    }
    (tokens, hlit, hdist)
}

fn trim_trailing_zero_run(lengths: &[u8], min_keep: usize) -> usize {
    let mut n = lengths.len();
    while n > min_keep && lengths[n - 1] == 0 {
        n -= 1;
    }
    n
}

/// Trims trailing zero entries from the code-length alphabet's own length vector (ordered
/// per `CLEN_ORDER`) to get `HCLEN`; DEFLATE always transmits at least 4 entries.
pub fn trim_hclen(clen_lengths_in_order: &[u8; 19]) -> usize {
    let mut n = 19;
    while n > 4 && clen_lengths_in_order[n - 1] == 0 {
        n -= 1;
    }
    n
}
