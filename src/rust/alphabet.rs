use std::collections::BTreeSet;
use std::fmt;

/// Standard amino acids in the canonical feature order
pub const STANDARD_AA: [char; 20] = [
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W',
    'Y',
];

/// Ordered residue alphabet shared by the encoder, the mutation generator and
/// the feature column layout.
///
/// Constructed once per process and passed around by reference; it is never
/// mutated after construction. Dipeptide column order is derived from the
/// residue order here, so a classifier trained on the standard layout only
/// works with [`Alphabet::standard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    residues: Vec<char>,
    /// ASCII byte -> residue index
    lookup: [Option<u8>; 128],
}

impl Alphabet {
    /// The 20 standard amino acids, alphabetically ordered
    pub fn standard() -> Self {
        Self::from_residues(&STANDARD_AA)
    }

    /// Build an alphabet from an ordered residue list. Duplicates and
    /// non-ASCII residues are dropped.
    pub fn from_residues(residues: &[char]) -> Self {
        let mut lookup = [None; 128];
        let mut ordered = Vec::with_capacity(residues.len());
        for &c in residues {
            if !c.is_ascii() || lookup[c as usize].is_some() {
                continue;
            }
            lookup[c as usize] = Some(ordered.len() as u8);
            ordered.push(c);
        }
        Alphabet { residues: ordered, lookup }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn residues(&self) -> &[char] {
        &self.residues
    }

    pub fn contains(&self, c: char) -> bool {
        self.index_of(c).is_some()
    }

    /// Position of a residue in the alphabet order
    #[inline]
    pub fn index_of(&self, c: char) -> Option<usize> {
        if c.is_ascii() {
            self.lookup[c as usize].map(usize::from)
        } else {
            None
        }
    }

    /// Byte-level variant of [`Alphabet::index_of`] used on hot paths
    #[inline]
    pub fn index_of_byte(&self, b: u8) -> Option<usize> {
        self.lookup.get(b as usize).copied().flatten().map(usize::from)
    }

    /// Sorted, de-duplicated characters of `sequence` that are not in the alphabet
    pub fn invalid_residues(&self, sequence: &str) -> Vec<char> {
        sequence
            .chars()
            .filter(|&c| !self.contains(c))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of ordered residue pairs (dipeptides)
    pub fn pair_count(&self) -> usize {
        self.len() * self.len()
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Display for Alphabet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.residues {
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}
