//! Allocation of table and column aliases for one request.

use std::collections::{BTreeMap, BTreeSet};

/// The symbols minified aliases are spelled with.
const ALPHABET: &[u8; 54] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ#$";

/// Plain table aliases are cut down to this many characters.
const MAX_TABLE_ALIAS_LENGTH: usize = 10;

/// What an alias is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasKind {
    Table,
    Column,
}

/// Hands out aliases. Each request gets a fresh namespace; aliases only depend on the
/// calls made on this instance.
#[derive(Debug, Clone, Default)]
pub struct AliasNamespace {
    minify: bool,
    /// How many minified names were handed out so far.
    issued: u64,
    used_table_aliases: BTreeSet<String>,
    column_assignments: BTreeMap<String, String>,
}

impl AliasNamespace {
    pub fn new(minify: bool) -> AliasNamespace {
        AliasNamespace {
            minify,
            ..AliasNamespace::default()
        }
    }

    /// An alias for a table or column named `name`.
    ///
    /// Minified table aliases ignore the name. Minified column aliases are cached per name,
    /// so asking twice for the same column name gives the same alias. This is only safe
    /// because rendered column aliases are always prefixed with their table path.
    pub fn generate(&mut self, kind: AliasKind, name: &str) -> String {
        match (self.minify, kind) {
            (true, AliasKind::Table) => self.next_minified(),
            (true, AliasKind::Column) => {
                if let Some(alias) = self.column_assignments.get(name) {
                    return alias.clone();
                }
                let alias = self.next_minified();
                self.column_assignments
                    .insert(name.to_string(), alias.clone());
                alias
            }
            (false, AliasKind::Column) => name.to_string(),
            (false, AliasKind::Table) => {
                let mut alias = sanitize_table_alias(name);
                while self.used_table_aliases.contains(&alias) {
                    alias.push('$');
                }
                self.used_table_aliases.insert(alias.clone());
                alias
            }
        }
    }

    /// The next string of a bijective base-54 count: `a` to `$`, then `aa`, `ab`, ...
    fn next_minified(&mut self) -> String {
        self.issued += 1;
        let base = ALPHABET.len() as u64;
        let mut remaining = self.issued;
        let mut symbols = Vec::new();
        while remaining > 0 {
            remaining -= 1;
            // always below 54
            #[allow(clippy::cast_possible_truncation)]
            symbols.push(ALPHABET[(remaining % base) as usize]);
            remaining /= base;
        }
        symbols.iter().rev().map(|symbol| char::from(*symbol)).collect()
    }
}

/// Strip whitespace, turn anything else that is not an ASCII letter or digit into `_`,
/// and keep the first ten characters.
fn sanitize_table_alias(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_TABLE_ALIAS_LENGTH)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_table_aliases_are_sanitized_and_disambiguated() {
        let mut namespace = AliasNamespace::new(false);
        assert_eq!(
            namespace.generate(AliasKind::Table, "Users Table!!"),
            "UsersTable"
        );
        assert_eq!(
            namespace.generate(AliasKind::Table, "Users Table!!"),
            "UsersTable$"
        );
        assert_eq!(
            namespace.generate(AliasKind::Table, "UsersTable"),
            "UsersTable$$"
        );
        assert_eq!(namespace.generate(AliasKind::Table, "a-b"), "a_b");
    }

    #[test]
    fn plain_column_aliases_pass_through() {
        let mut namespace = AliasNamespace::new(false);
        assert_eq!(namespace.generate(AliasKind::Column, "email"), "email");
        assert_eq!(namespace.generate(AliasKind::Column, "email"), "email");
    }

    #[test]
    fn minified_table_aliases_count_through_the_alphabet() {
        let mut namespace = AliasNamespace::new(true);
        let aliases: Vec<String> = (0..57)
            .map(|_| namespace.generate(AliasKind::Table, "ignored"))
            .collect();
        let singles: Vec<String> = ALPHABET.iter().map(|c| char::from(*c).to_string()).collect();
        assert_eq!(aliases[..54], singles[..]);
        assert_eq!(aliases[54], "aa");
        assert_eq!(aliases[55], "ab");
        assert_eq!(aliases[56], "ac");
    }

    #[test]
    fn minified_column_aliases_are_cached_per_name() {
        let mut namespace = AliasNamespace::new(true);
        let email = namespace.generate(AliasKind::Column, "email");
        assert_eq!(namespace.generate(AliasKind::Column, "email"), email);
        assert_ne!(namespace.generate(AliasKind::Column, "name"), email);
        // tables and columns share one counter
        assert_eq!(namespace.generate(AliasKind::Table, "users"), "c");
    }
}
