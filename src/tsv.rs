//! Tabular sentence reader
//!
//! Reads tab-separated token rows into `Tree` structures, one tree per
//! blank-line separated sentence. Which column holds which field is given by
//! a `FieldIndex`, so both CoNLL-X/CoNLL-U files and compact layouts work.
//! Files ending in `.gz` are decompressed transparently.

use crate::features::{EMPTY_FIELD, FeatureMap, ParseError};
use crate::tree::{Node, NodeId, Tree, TreeError};
use atoi::FromRadix10Checked;
use flate2::read::MultiGzDecoder;
use log::debug;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;
use thiserror::Error;

/// Error while reading a sentence
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error at line {line_num}: {source}")]
    Io {
        line_num: usize,
        #[source]
        source: io::Error,
    },
    #[error("line {line_num}: {message}")]
    Format { line_num: usize, message: String },
    #[error("line {line_num}: {source}")]
    Feats {
        line_num: usize,
        #[source]
        source: ParseError,
    },
    #[error("line {line_num}: {source}")]
    Tree {
        line_num: usize,
        #[source]
        source: TreeError,
    },
}

impl ReadError {
    pub fn line_num(&self) -> usize {
        match self {
            ReadError::Io { line_num, .. }
            | ReadError::Format { line_num, .. }
            | ReadError::Feats { line_num, .. }
            | ReadError::Tree { line_num, .. } => *line_num,
        }
    }
}

/// Column positions of the fields a tree is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIndex {
    pub id: usize,
    pub form: usize,
    pub lemma: usize,
    pub pos: usize,
    pub feats: usize,
    pub head: usize,
    pub deprel: usize,
}

impl FieldIndex {
    /// Explicit column positions, with the id in column 0
    pub fn new(
        form: usize,
        lemma: usize,
        pos: usize,
        feats: usize,
        head: usize,
        deprel: usize,
    ) -> Self {
        Self {
            id: 0,
            form,
            lemma,
            pos,
            feats,
            head,
            deprel,
        }
    }

    /// CoNLL-X / CoNLL-U layout (POS read from the UPOS/CPOSTAG column)
    pub fn conllx() -> Self {
        Self::new(1, 2, 3, 5, 6, 7)
    }

    /// Seven-column layout written by `Display for Tree`
    pub fn compact() -> Self {
        Self::new(1, 2, 3, 4, 5, 6)
    }

    fn min_columns(&self) -> usize {
        [
            self.id,
            self.form,
            self.lemma,
            self.pos,
            self.feats,
            self.head,
            self.deprel,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }
}

impl Default for FieldIndex {
    fn default() -> Self {
        Self::conllx()
    }
}

/// Reader that iterates over sentences
pub struct TsvReader<R: BufRead> {
    lines: Lines<R>,
    line_num: usize,
    index: FieldIndex,
}

impl<R: BufRead> TsvReader<R> {
    pub fn new(reader: R, index: FieldIndex) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
            index,
        }
    }

    /// Discard the rest of the current sentence, up to a blank line or EOF
    fn skip_sentence(&mut self) {
        for line in self.lines.by_ref() {
            self.line_num += 1;
            if line.is_ok_and(|l| l.trim().is_empty()) {
                break;
            }
        }
        debug!("skipped unreadable sentence ending at line {}", self.line_num);
    }
}

impl TsvReader<Box<dyn BufRead>> {
    /// Create a reader from a file path, gunzipping `.gz` files
    pub fn from_file(path: &Path, index: FieldIndex) -> io::Result<Self> {
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::new(MultiGzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader, index))
    }
}

impl<'a> TsvReader<&'a [u8]> {
    /// Create a reader from a string
    pub fn from_string(text: &'a str, index: FieldIndex) -> Self {
        Self::new(text.as_bytes(), index)
    }
}

impl<R: BufRead> Iterator for TsvReader<R> {
    type Item = Result<Tree, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut tree_lines = Vec::new();

        // Read lines until we hit a blank line (sentence boundary) or EOF
        loop {
            self.line_num += 1;
            match self.lines.next() {
                None => {
                    if tree_lines.is_empty() {
                        return None;
                    }
                    break;
                }
                Some(Err(source)) => {
                    let line_num = self.line_num;
                    self.skip_sentence();
                    return Some(Err(ReadError::Io { line_num, source }));
                }
                Some(Ok(line)) => {
                    let line = line.trim_end_matches(['\r', '\n']);

                    if line.trim().is_empty() {
                        if !tree_lines.is_empty() {
                            break;
                        }
                        continue;
                    }

                    if line.starts_with('#') {
                        debug!("skipping comment at line {}", self.line_num);
                        continue;
                    }

                    tree_lines.push((self.line_num, line.to_string()));
                }
            }
        }

        debug!(
            "read sentence of {} rows ending at line {}",
            tree_lines.len(),
            self.line_num
        );
        Some(parse_tree(&tree_lines, &self.index))
    }
}

/// A parsed row whose head has not been wired yet
struct Row {
    line_num: usize,
    node: NodeId,
    head: Option<usize>,
    deprel: String,
}

/// Build a tree from accumulated rows; heads are wired after all nodes exist
fn parse_tree(lines: &[(usize, String)], index: &FieldIndex) -> Result<Tree, ReadError> {
    let mut tree = Tree::with_capacity(lines.len());
    let mut rows = Vec::with_capacity(lines.len());

    for (line_num, line) in lines {
        let line_num = *line_num;
        let Some((node, head, deprel)) = parse_line(line, line_num, index)? else {
            continue;
        };
        let node = tree
            .add_node(node)
            .map_err(|source| ReadError::Tree { line_num, source })?;
        rows.push(Row {
            line_num,
            node,
            head,
            deprel,
        });
    }

    for row in rows {
        let Some(head_id) = row.head else {
            continue;
        };
        let Some(head) = tree.find(head_id) else {
            return Err(ReadError::Format {
                line_num: row.line_num,
                message: format!("HEAD {} does not match any token id", head_id),
            });
        };
        tree.add_dependent(head, row.node, row.deprel)
            .map_err(|source| ReadError::Tree {
                line_num: row.line_num,
                source,
            })?;
    }

    Ok(tree)
}

/// Parse one row into a node, its head id and its relation label.
///
/// Returns None for multiword-token ranges (`1-2`) and empty nodes (`2.1`).
fn parse_line(
    line: &str,
    line_num: usize,
    index: &FieldIndex,
) -> Result<Option<(Node, Option<usize>, String)>, ReadError> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < index.min_columns() {
        return Err(ReadError::Format {
            line_num,
            message: format!(
                "Expected at least {} fields, found {}",
                index.min_columns(),
                fields.len()
            ),
        });
    }

    let id_field = fields[index.id];
    if is_range_or_decimal(id_field) {
        debug!("skipping multiword or empty token {} at line {}", id_field, line_num);
        return Ok(None);
    }
    let id = parse_number(id_field, "ID", line_num)?;

    let form = fields[index.form];
    let lemma = optional(fields[index.lemma]);
    let pos = optional(fields[index.pos]);

    let feats: FeatureMap = fields[index.feats]
        .parse()
        .map_err(|source| ReadError::Feats { line_num, source })?;

    let head = match fields[index.head] {
        EMPTY_FIELD => None,
        s => Some(parse_number(s, "HEAD", line_num)?),
    };

    let deprel = optional(fields[index.deprel]).to_string();

    let node = Node::with_fields(id, form, lemma, pos, feats);
    Ok(Some((node, head, deprel)))
}

/// True for `N-M` multiword ranges and `N.M` empty-node ids
fn is_range_or_decimal(s: &str) -> bool {
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    s.split_once(['-', '.'])
        .is_some_and(|(main, sub)| digits(main) && digits(sub))
}

fn optional(s: &str) -> &str {
    if s == EMPTY_FIELD { "" } else { s }
}

/// Parse a whole field as an unsigned integer
fn parse_number(s: &str, name: &str, line_num: usize) -> Result<usize, ReadError> {
    let bytes = s.as_bytes();
    let (n, used) = usize::from_radix_10_checked(bytes);
    match n {
        Some(n) if used == bytes.len() && used > 0 => Ok(n),
        _ => Err(ReadError::Format {
            line_num,
            message: format!("Invalid {}: {}", name, s),
        }),
    }
}
