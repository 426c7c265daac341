//! Huffman coding over text, with a recorded trace of the tree construction.
//!
//! The builder is the textbook greedy merge: repeatedly take the two nodes with
//! the lowest frequency and join them under a new parent. Every merge is
//! recorded so each intermediate queue can be replayed as a [`BuildStep`].
//!
//! Ties are broken by creation order: leaves are created in first-occurrence
//! order of their symbol, internal nodes after all leaves in merge order, and
//! among nodes of equal frequency the earlier-created one is taken first. The
//! exact codes and the trace depend on this rule; the code lengths stay optimal
//! either way.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::fmt;
use std::rc::Rc;

use log::{debug, trace, warn};

use super::{CompressionStats, Stepper, TextCompression};
use crate::cs::error::{Error, Result};

/// Stable identifier of a node, assigned when the node is created.
///
/// Ids order by creation: every leaf before every internal node, leaves by
/// their position in the frequency table, internal nodes by merge iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// The leaf for the `n`-th entry of the frequency table.
    Leaf(usize),
    /// The parent created by merge iteration `n` (starting at 1).
    Internal(usize),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Leaf(index) => write!(f, "leaf-{index}"),
            NodeId::Internal(iteration) => write!(f, "internal-{iteration}"),
        }
    }
}

/// Represents a node in the Huffman tree.
///
/// Children are reference counted, so a node can sit in the finished tree and
/// in any number of trace snapshots without being copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffmanNode {
    /// A leaf node contains a symbol and its frequency.
    Leaf { id: NodeId, symbol: char, freq: usize },
    /// An internal node with left and right children and combined frequency.
    Internal {
        id: NodeId,
        freq: usize,
        left: Rc<HuffmanNode>,
        right: Rc<HuffmanNode>,
    },
}

impl HuffmanNode {
    /// Returns the frequency of the node.
    pub fn freq(&self) -> usize {
        match self {
            HuffmanNode::Leaf { freq, .. } => *freq,
            HuffmanNode::Internal { freq, .. } => *freq,
        }
    }

    /// Returns the creation id of the node.
    pub fn id(&self) -> NodeId {
        match self {
            HuffmanNode::Leaf { id, .. } => *id,
            HuffmanNode::Internal { id, .. } => *id,
        }
    }

    /// The symbol of a leaf, `None` for internal nodes.
    pub fn symbol(&self) -> Option<char> {
        match self {
            HuffmanNode::Leaf { symbol, .. } => Some(*symbol),
            HuffmanNode::Internal { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffmanNode::Leaf { .. })
    }

    /// The `(left, right)` children of an internal node.
    pub fn children(&self) -> Option<(&HuffmanNode, &HuffmanNode)> {
        match self {
            HuffmanNode::Leaf { .. } => None,
            HuffmanNode::Internal { left, right, .. } => Some((&**left, &**right)),
        }
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self.children() {
            None => 1,
            Some((left, right)) => left.leaf_count() + right.leaf_count(),
        }
    }

    /// Length of the longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        match self.children() {
            None => 0,
            Some((left, right)) => 1 + left.depth().max(right.depth()),
        }
    }

    fn queue_key(&self) -> (usize, NodeId) {
        (self.freq(), self.id())
    }
}

/// A helper wrapper for HuffmanNode for use in a BinaryHeap.
/// We want the node with the smallest (frequency, id) to have highest priority.
#[derive(Debug, Clone)]
struct NodeWrapper(Rc<HuffmanNode>);

impl PartialEq for NodeWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.0.queue_key() == other.0.queue_key()
    }
}

impl Eq for NodeWrapper {}

impl Ord for NodeWrapper {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse: lower frequency, then earlier creation, should come first.
        other.0.queue_key().cmp(&self.0.queue_key())
    }
}

impl PartialOrd for NodeWrapper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Symbol counts in order of first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(char, usize)>,
    index: HashMap<char, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `symbol`.
    pub fn add(&mut self, symbol: char) {
        match self.index.get(&symbol) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(symbol, self.entries.len());
                self.entries.push((symbol, 1));
            }
        }
    }

    pub fn get(&self, symbol: char) -> Option<usize> {
        self.index.get(&symbol).map(|&slot| self.entries[slot].1)
    }

    /// Number of distinct symbols.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts, i.e. the number of symbols scanned.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|&(_, count)| count).sum()
    }

    /// `(symbol, count)` pairs in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (char, usize)> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<char> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = char>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for symbol in iter {
            table.add(symbol);
        }
        table
    }
}

/// Snapshot of the priority queue after one iteration of the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildStep {
    /// Remaining nodes, ascending by frequency, ties by creation order.
    pub queue: Vec<Rc<HuffmanNode>>,
    /// The parent created in this iteration; its children are the merged pair.
    /// `None` for the initial snapshot.
    pub combined: Option<Rc<HuffmanNode>>,
    /// 0 for the initial snapshot, then the merge number.
    pub iteration: usize,
}

impl BuildStep {
    /// The `(left, right)` pair merged in this iteration.
    pub fn merged_pair(&self) -> Option<(&HuffmanNode, &HuffmanNode)> {
        self.combined.as_deref().and_then(HuffmanNode::children)
    }
}

/// The finished tree together with the merges that produced it.
///
/// Only the initial queue and the parent created by each merge are kept. The
/// [`BuildStep`] snapshots are rebuilt from them on demand by [`replay`], so a
/// build over `n` symbols holds `O(n)` nodes however it is stepped through.
///
/// [`replay`]: TreeBuild::replay
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeBuild {
    /// Root of the tree, `None` for an empty frequency table.
    pub tree: Option<Rc<HuffmanNode>>,
    initial: Vec<Rc<HuffmanNode>>,
    merges: Vec<Rc<HuffmanNode>>,
}

impl TreeBuild {
    /// The leaves in queue order, before any merge.
    pub fn initial_queue(&self) -> &[Rc<HuffmanNode>] {
        &self.initial
    }

    /// The parent created by each merge, in merge order.
    pub fn merges(&self) -> &[Rc<HuffmanNode>] {
        &self.merges
    }

    /// Number of snapshots in the trace: the initial one plus one per merge.
    pub fn step_count(&self) -> usize {
        if self.initial.is_empty() {
            0
        } else {
            self.merges.len() + 1
        }
    }

    /// A cursor that rebuilds the snapshots one at a time.
    pub fn replay(&self) -> TraceReplay<'_> {
        TraceReplay::new(self)
    }

    /// Every snapshot in order.
    pub fn steps(&self) -> impl Iterator<Item = BuildStep> + '_ {
        let mut replay = self.replay();
        std::iter::from_fn(move || replay.step())
    }

    /// The snapshot taken after merge `iteration` (0 is the initial queue).
    pub fn step(&self, iteration: usize) -> Option<BuildStep> {
        self.steps().nth(iteration)
    }
}

/// Replays a recorded tree construction one [`BuildStep`] at a time.
#[derive(Debug, Clone)]
pub struct TraceReplay<'a> {
    build: &'a TreeBuild,
    queue: Vec<Rc<HuffmanNode>>,
    next: usize,
}

impl<'a> TraceReplay<'a> {
    pub fn new(build: &'a TreeBuild) -> Self {
        Self {
            build,
            queue: Vec::new(),
            next: 0,
        }
    }

    /// The queue as of the most recently returned step.
    pub fn queue(&self) -> &[Rc<HuffmanNode>] {
        &self.queue
    }

    /// Number of steps returned so far.
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn len(&self) -> usize {
        self.build.step_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Stepper for TraceReplay<'_> {
    type Step = BuildStep;

    fn step(&mut self) -> Option<BuildStep> {
        if self.is_finished() {
            return None;
        }
        let combined = match self.next.checked_sub(1) {
            None => {
                self.queue.clone_from(&self.build.initial);
                None
            }
            Some(merge) => {
                let parent = self.build.merges.get(merge)?;
                // The merged pair is always the front of the sorted queue.
                self.queue.drain(..self.queue.len().min(2));
                let key = parent.queue_key();
                let at = self.queue.partition_point(|node| node.queue_key() < key);
                self.queue.insert(at, Rc::clone(parent));
                Some(Rc::clone(parent))
            }
        };
        let step = BuildStep {
            queue: self.queue.clone(),
            combined,
            iteration: self.next,
        };
        self.next += 1;
        Some(step)
    }

    fn is_finished(&self) -> bool {
        self.next >= self.build.step_count()
    }

    fn reset(&mut self) {
        self.next = 0;
        self.queue.clear();
    }
}

/// Symbol to bit-string code, in depth-first leaf order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    entries: Vec<(char, String)>,
    index: HashMap<char, usize>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the code for `symbol`, replacing any previous one.
    pub fn insert(&mut self, symbol: char, code: String) {
        match self.index.get(&symbol) {
            Some(&slot) => self.entries[slot].1 = code,
            None => {
                self.index.insert(symbol, self.entries.len());
                self.entries.push((symbol, code));
            }
        }
    }

    pub fn get(&self, symbol: char) -> Option<&str> {
        self.index
            .get(&symbol)
            .map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> + '_ {
        self.entries
            .iter()
            .map(|(symbol, code)| (*symbol, code.as_str()))
    }
}

/// Root path of every node in a tree, internal nodes included.
pub type NodeCodes = HashMap<NodeId, String>;

/// Build a frequency table mapping each symbol in `input` to its frequency.
pub fn build_frequency_table(input: &str) -> FrequencyTable {
    input.chars().collect()
}

fn leaf_nodes(freq_table: &FrequencyTable) -> Vec<Rc<HuffmanNode>> {
    freq_table
        .iter()
        .enumerate()
        .map(|(index, (symbol, freq))| {
            Rc::new(HuffmanNode::Leaf {
                id: NodeId::Leaf(index),
                symbol,
                freq,
            })
        })
        .collect()
}

/// Combine nodes until only one tree remains, handing each new parent to
/// `on_merge`.
fn merge_nodes(
    leaves: Vec<Rc<HuffmanNode>>,
    mut on_merge: impl FnMut(&Rc<HuffmanNode>),
) -> Option<Rc<HuffmanNode>> {
    let mut heap: BinaryHeap<NodeWrapper> = leaves.into_iter().map(NodeWrapper).collect();
    let mut iteration = 1;
    while heap.len() > 1 {
        let (Some(NodeWrapper(left)), Some(NodeWrapper(right))) = (heap.pop(), heap.pop()) else {
            break;
        };
        trace!(
            "merge {iteration}: {} ({}) + {} ({})",
            left.id(),
            left.freq(),
            right.id(),
            right.freq()
        );
        let parent = Rc::new(HuffmanNode::Internal {
            id: NodeId::Internal(iteration),
            freq: left.freq() + right.freq(),
            left,
            right,
        });
        on_merge(&parent);
        heap.push(NodeWrapper(parent));
        iteration += 1;
    }
    heap.pop().map(|NodeWrapper(root)| root)
}

/// Build the Huffman tree given a frequency table.
/// Returns `None` if the frequency table is empty.
pub fn build_huffman_tree(freq_table: &FrequencyTable) -> Option<HuffmanNode> {
    let root = merge_nodes(leaf_nodes(freq_table), |_| {})?;
    debug!("built huffman tree over {} symbols", freq_table.len());
    Some(Rc::try_unwrap(root).unwrap_or_else(|shared| (*shared).clone()))
}

/// Build the Huffman tree and record every merge for [`TreeBuild::replay`].
///
/// An empty table yields no tree and no steps. A table with one symbol yields
/// that symbol's leaf as the tree and only the initial snapshot.
pub fn build_huffman_tree_with_steps(freq_table: &FrequencyTable) -> TreeBuild {
    if freq_table.is_empty() {
        debug!("empty frequency table, no tree to build");
        return TreeBuild::default();
    }

    let mut initial = leaf_nodes(freq_table);
    initial.sort_by_key(|node| node.queue_key());
    let mut merges = Vec::with_capacity(initial.len() - 1);
    let tree = merge_nodes(initial.clone(), |parent| merges.push(Rc::clone(parent)));
    debug!(
        "built huffman tree over {} symbols in {} merges",
        freq_table.len(),
        merges.len()
    );
    TreeBuild {
        tree,
        initial,
        merges,
    }
}

/// Calls `visit` on every node with its path from the root, children before
/// their parent and left before right. A lone leaf root gets the path `"0"`.
fn walk_paths(root: &HuffmanNode, mut visit: impl FnMut(&HuffmanNode, &str)) {
    if root.is_leaf() {
        visit(root, "0");
    } else {
        walk_paths_from(root, &mut String::new(), &mut visit);
    }
}

fn walk_paths_from<F>(node: &HuffmanNode, path: &mut String, visit: &mut F)
where
    F: FnMut(&HuffmanNode, &str),
{
    if let Some((left, right)) = node.children() {
        for (bit, child) in [('0', left), ('1', right)] {
            path.push(bit);
            walk_paths_from(child, path, visit);
            path.pop();
        }
    }
    visit(node, path);
}

/// Build the code table mapping symbols to their Huffman codes.
///
/// If the tree consists of a single leaf (i.e. one unique symbol), the code "0" is assigned.
pub fn build_code_table(root: &HuffmanNode) -> CodeTable {
    let mut table = CodeTable::new();
    walk_paths(root, |node, path| {
        if let Some(symbol) = node.symbol() {
            table.insert(symbol, path.to_string());
        }
    });
    debug!("generated {} huffman codes", table.len());
    table
}

/// Label every node with its path from the root.
///
/// Leaves get the same string as their entry in [`build_code_table`]. The root
/// of a multi-node tree gets the empty string.
pub fn label_nodes(root: &HuffmanNode) -> NodeCodes {
    let mut labels = NodeCodes::new();
    walk_paths(root, |node, path| {
        labels.insert(node.id(), path.to_string());
    });
    labels
}

/// Encode the input string using the provided code table.
/// Each symbol is replaced with its Huffman code.
///
/// Fails with [`Error::UnknownSymbol`] on the first symbol that has no code.
pub fn encode(input: &str, code_table: &CodeTable) -> Result<String> {
    let mut bits = String::new();
    for (position, symbol) in input.chars().enumerate() {
        let code = code_table
            .get(symbol)
            .ok_or(Error::UnknownSymbol { symbol, position })?;
        bits.push_str(code);
    }
    Ok(bits)
}

/// Output of [`encode_lossy`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LossyEncoding {
    pub bits: String,
    /// Number of input symbols dropped because they had no code.
    pub skipped: usize,
}

/// Encode like [`encode`], but drop symbols that have no code instead of failing.
///
/// The result does not decode back to `input` when `skipped > 0`.
pub fn encode_lossy(input: &str, code_table: &CodeTable) -> LossyEncoding {
    let mut encoding = LossyEncoding::default();
    for symbol in input.chars() {
        match code_table.get(symbol) {
            Some(code) => encoding.bits.push_str(code),
            None => encoding.skipped += 1,
        }
    }
    if encoding.skipped > 0 {
        warn!(
            "dropped {} symbols with no huffman code while encoding",
            encoding.skipped
        );
    }
    encoding
}

fn malformed(position: usize, reason: impl Into<String>) -> Error {
    Error::MalformedEncodedInput {
        position,
        reason: reason.into(),
    }
}

/// Decode an encoded bit string using the Huffman tree.
/// Traverses the tree according to each bit until a leaf is reached.
///
/// A single-leaf tree reads every `'0'` as one occurrence of its symbol.
pub fn decode(encoded: &str, tree: &HuffmanNode) -> Result<String> {
    let mut result = String::new();
    let mut current = tree;
    let mut code_start = 0;
    let mut consumed = 0;

    for (position, bit) in encoded.chars().enumerate() {
        consumed = position + 1;
        let next = match (current, bit) {
            (HuffmanNode::Internal { left, .. }, '0') => &**left,
            (HuffmanNode::Internal { right, .. }, '1') => &**right,
            (HuffmanNode::Leaf { .. }, '0') => current,
            (HuffmanNode::Leaf { .. }, '1') => {
                return Err(malformed(position, "single-symbol tree has no branch for '1'"))
            }
            (_, other) => {
                return Err(malformed(
                    position,
                    format!("expected '0' or '1', found {other:?}"),
                ))
            }
        };
        match next {
            HuffmanNode::Leaf { symbol, .. } => {
                result.push(*symbol);
                current = tree;
                code_start = consumed;
            }
            HuffmanNode::Internal { .. } => current = next,
        }
    }

    if code_start < consumed {
        return Err(malformed(
            consumed,
            format!("input ends inside the code starting at bit {code_start}"),
        ));
    }
    Ok(result)
}

/// What to do with symbols that have no code when encoding against an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownSymbolPolicy {
    /// Stop with [`Error::UnknownSymbol`].
    #[default]
    Fail,
    /// Drop the symbol, count it and log a warning.
    Skip,
}

/// Configuration for the Huffman pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanConfig {
    /// Policy for [`Huffman::encode_with_codes`]
    pub unknown_symbols: UnknownSymbolPolicy,
    /// Width of one uncompressed symbol, for [`CompressionStats`]
    pub bits_per_symbol: usize,
}

impl Default for HuffmanConfig {
    fn default() -> Self {
        Self {
            unknown_symbols: UnknownSymbolPolicy::Fail,
            bits_per_symbol: 8,
        }
    }
}

/// Every artifact of one Huffman run.
#[derive(Debug, Clone, PartialEq)]
pub struct HuffmanEncoding {
    pub frequencies: FrequencyTable,
    pub build: TreeBuild,
    pub codes: CodeTable,
    pub encoded: String,
    pub stats: CompressionStats,
}

impl HuffmanEncoding {
    pub fn tree(&self) -> Option<&HuffmanNode> {
        self.build.tree.as_deref()
    }
}

/// Huffman coder holding its configuration.
#[derive(Debug, Clone, Default)]
pub struct Huffman {
    config: HuffmanConfig,
}

impl Huffman {
    pub fn new(config: HuffmanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HuffmanConfig {
        &self.config
    }

    /// Encode `input` with a table built from some other text, applying the
    /// configured [`UnknownSymbolPolicy`].
    pub fn encode_with_codes(&self, input: &str, codes: &CodeTable) -> Result<LossyEncoding> {
        match self.config.unknown_symbols {
            UnknownSymbolPolicy::Fail => Ok(LossyEncoding {
                bits: encode(input, codes)?,
                skipped: 0,
            }),
            UnknownSymbolPolicy::Skip => Ok(encode_lossy(input, codes)),
        }
    }
}

impl TextCompression for Huffman {
    type Encoded = HuffmanEncoding;

    fn compress(&self, input: &str) -> Result<HuffmanEncoding> {
        let frequencies = build_frequency_table(input);
        let build = build_huffman_tree_with_steps(&frequencies);
        let codes = build.tree.as_deref().map(build_code_table).unwrap_or_default();
        let encoded = encode(input, &codes)?;
        let stats = CompressionStats::new(
            frequencies.total(),
            self.config.bits_per_symbol,
            encoded.len(),
        );
        Ok(HuffmanEncoding {
            frequencies,
            build,
            codes,
            encoded,
            stats,
        })
    }

    fn decompress(&self, encoded: &HuffmanEncoding) -> Result<String> {
        huffman_decode(&encoded.encoded, encoded.tree())
    }
}

/// Convenience function: counts frequencies, builds the tree and codes, and
/// encodes the input with the default configuration.
pub fn huffman_encode(input: &str) -> Result<HuffmanEncoding> {
    Huffman::default().compress(input)
}

/// Convenience function: decodes an encoded bit string using the provided Huffman tree.
///
/// Without a tree only the empty bit string is valid.
pub fn huffman_decode(encoded: &str, tree: Option<&HuffmanNode>) -> Result<String> {
    match tree {
        Some(tree) => decode(encoded, tree),
        None if encoded.is_empty() => Ok(String::new()),
        None => Err(malformed(0, "no tree to decode with")),
    }
}
