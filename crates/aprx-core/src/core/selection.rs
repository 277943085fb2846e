//! The AMBER atom-mask selection language.
//!
//! Masks are the addressing scheme the whole APR workflow is built on:
//! restraints name their anchor atoms as masks (`:CB6@O,O2`, `:BUT@C*`,
//! `@K+`), and the resolved indices end up in the AMBER NMR restraint files.
//!
//! The supported grammar is the subset AMBER tooling actually uses for APR
//! setups:
//!
//! - `:NAME` selects residues by name, `:N` by 1-based file position.
//! - `@NAME` selects atoms by name; comma-separated lists are unions.
//! - A trailing `*` makes a name a prefix pattern (`@C*` matches `C`, `C1`).
//! - `:RES@AT` restricts atom selection to matching residues.
//! - A new `:`-token after a comma starts an independent group; the final
//!   selection is the union of all groups (`:1@O,O1,:BUT@H1`).

use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Mask is empty")]
    EmptyMask,
    #[error("Invalid mask '{mask}': {reason}")]
    Syntax { mask: String, reason: String },
    #[error("Mask '{mask}' selects no atoms")]
    EmptySelection { mask: String },
}

/// A name matcher: exact, or prefix when the source token ended in `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct NamePattern {
    prefix: String,
    wildcard: bool,
}

impl NamePattern {
    fn parse(token: &str) -> Self {
        match token.strip_suffix('*') {
            Some(prefix) => Self {
                prefix: prefix.to_string(),
                wildcard: true,
            },
            None => Self {
                prefix: token.to_string(),
                wildcard: false,
            },
        }
    }

    fn matches(&self, name: &str) -> bool {
        if self.wildcard {
            name.starts_with(self.prefix.as_str())
        } else {
            name == self.prefix
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ResidueSel {
    Name(NamePattern),
    Number(isize),
}

impl ResidueSel {
    fn parse(token: &str) -> Self {
        match token.parse::<isize>() {
            Ok(number) => ResidueSel::Number(number),
            Err(_) => ResidueSel::Name(NamePattern::parse(token)),
        }
    }

    fn matches(&self, residue: &Residue, ordinal: isize) -> bool {
        match self {
            ResidueSel::Name(pattern) => pattern.matches(&residue.name),
            ResidueSel::Number(number) => *number == ordinal,
        }
    }
}

/// One `:RES@ATOMS` group; the overall mask is a union of groups.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MaskGroup {
    residues: Vec<ResidueSel>,
    atoms: Vec<NamePattern>,
}

impl MaskGroup {
    fn new() -> Self {
        Self {
            residues: Vec::new(),
            atoms: Vec::new(),
        }
    }

    fn matches(&self, residue: &Residue, ordinal: isize, atom_name: &str) -> bool {
        let residue_ok = self.residues.is_empty()
            || self.residues.iter().any(|r| r.matches(residue, ordinal));
        let atom_ok = self.atoms.is_empty() || self.atoms.iter().any(|a| a.matches(atom_name));
        residue_ok && atom_ok
    }
}

/// A parsed AMBER atom mask.
///
/// Construct with [`FromStr`] and resolve against a [`Structure`] with
/// [`AmberMask::indices`] (0-based) or [`AmberMask::amber_indices`]
/// (1-based, the numbering AMBER input files use).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmberMask {
    raw: String,
    groups: Vec<MaskGroup>,
}

// Comma context while scanning: are bare tokens residue names or atom names?
#[derive(Clone, Copy, PartialEq)]
enum TokenContext {
    None,
    Residue,
    Atom,
}

impl FromStr for AmberMask {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(SelectionError::EmptyMask);
        }

        let syntax = |reason: &str| SelectionError::Syntax {
            mask: raw.to_string(),
            reason: reason.to_string(),
        };

        let mut groups: Vec<MaskGroup> = Vec::new();
        let mut context = TokenContext::None;

        for token in raw.split(',') {
            let token = token.trim();
            if token.is_empty() {
                return Err(syntax("empty list item"));
            }

            if let Some(rest) = token.strip_prefix(':') {
                // A ':' token always opens a new group.
                let mut group = MaskGroup::new();
                match rest.split_once('@') {
                    Some((res_part, atom_part)) => {
                        if res_part.is_empty() || atom_part.is_empty() {
                            return Err(syntax("empty residue or atom name"));
                        }
                        group.residues.push(ResidueSel::parse(res_part));
                        group.atoms.push(NamePattern::parse(atom_part));
                        context = TokenContext::Atom;
                    }
                    None => {
                        if rest.is_empty() {
                            return Err(syntax("empty residue name"));
                        }
                        group.residues.push(ResidueSel::parse(rest));
                        context = TokenContext::Residue;
                    }
                }
                groups.push(group);
            } else if let Some(rest) = token.strip_prefix('@') {
                if rest.is_empty() {
                    return Err(syntax("empty atom name"));
                }
                if groups.is_empty() {
                    groups.push(MaskGroup::new());
                }
                groups
                    .last_mut()
                    .unwrap()
                    .atoms
                    .push(NamePattern::parse(rest));
                context = TokenContext::Atom;
            } else {
                let group = groups.last_mut().ok_or_else(|| {
                    syntax("mask must start with ':' or '@'")
                })?;
                match context {
                    TokenContext::Atom => group.atoms.push(NamePattern::parse(token)),
                    TokenContext::Residue => group.residues.push(ResidueSel::parse(token)),
                    TokenContext::None => {
                        return Err(syntax("mask must start with ':' or '@'"));
                    }
                }
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            groups,
        })
    }
}

impl AmberMask {
    /// Returns the original mask text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Resolves the mask to 0-based atom indices in file order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::EmptySelection`] when nothing matches; a
    /// silent empty selection is almost always a typo in the mask.
    pub fn indices(&self, structure: &Structure) -> Result<Vec<usize>, SelectionError> {
        let mut residue_ordinal = HashMap::new();
        for (ordinal, (id, _)) in structure.residues_iter().enumerate() {
            residue_ordinal.insert(id, ordinal as isize + 1);
        }

        let mut selected = BTreeSet::new();
        for (index, (_, atom)) in structure.atoms_iter().enumerate() {
            let residue = structure
                .residue(atom.residue_id)
                .expect("atom references live residue");
            let ordinal = residue_ordinal[&atom.residue_id];
            if self
                .groups
                .iter()
                .any(|g| g.matches(residue, ordinal, &atom.name))
            {
                selected.insert(index);
            }
        }

        if selected.is_empty() {
            return Err(SelectionError::EmptySelection {
                mask: self.raw.clone(),
            });
        }
        Ok(selected.into_iter().collect())
    }

    /// Resolves the mask to 1-based atom indices (AMBER numbering).
    pub fn amber_indices(&self, structure: &Structure) -> Result<Vec<usize>, SelectionError> {
        Ok(self.indices(structure)?.into_iter().map(|i| i + 1).collect())
    }
}
