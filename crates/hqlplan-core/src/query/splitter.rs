//! Splitting of polymorphic queries into concrete queries.
//!
//! A query naming a supertype in its `from` clause must be run once per
//! concrete entity implementing that type. The splitter rewrites each such
//! name into every implementor and returns the cartesian product of the
//! rewrites; names in the select clause are left alone.

use std::sync::Arc;

use hqlplan_lang::{tokenize, SpannedToken, Token};
use tracing::warn;

use crate::catalog::EntityCatalog;
use crate::error::{QueryError, Result};

/// Tokens after which a name may be an entity reference.
const BEFORE_CLASS_TOKENS: &[&str] = &["from", "delete", "update", "join", ","];

/// Tokens that rule out the preceding name being an entity reference.
const NOT_AFTER_CLASS_TOKENS: &[&str] = &["in", "from", ")"];

enum Segment<'q> {
    Text(&'q str),
    Placeholder(usize),
}

/// Split `query` into one concrete query per combination of implementors.
///
/// Returns an empty list when some referenced type has no implementors.
pub fn concrete_queries(query: &str, catalog: &EntityCatalog) -> Result<Vec<String>> {
    let tokens = tokenize(query).map_err(QueryError::from)?;
    if tokens.is_empty() {
        return Ok(vec![query.to_string()]);
    }

    let mut segments = Vec::with_capacity(tokens.len());
    let mut replacements: Vec<Arc<[String]>> = Vec::new();
    let mut last: Option<String> = None;

    let start = select_clause_end(&tokens);
    for token in &tokens[..start] {
        segments.push(Segment::Text(token.text(query)));
        if !token.token.is_whitespace() {
            last = Some(token.text(query).to_ascii_lowercase());
        }
    }

    for (i, token) in tokens.iter().enumerate().skip(start) {
        let text = token.text(query);
        if matches!(token.token, Token::Whitespace | Token::StringLiteral) {
            segments.push(Segment::Text(text));
            continue;
        }

        let next = tokens[i + 1..]
            .iter()
            .find(|t| !t.token.is_whitespace())
            .map(|t| t.text(query).to_ascii_lowercase());
        let candidate = matches!(token.token, Token::Word(_))
            && is_identifier(text)
            && is_possibly_class_name(last.as_deref(), next.as_deref());
        last = Some(text.to_ascii_lowercase());

        if candidate {
            if let Some(type_name) = catalog.resolve_import(text)? {
                segments.push(Segment::Placeholder(replacements.len()));
                replacements.push(catalog.implementors(type_name));
                continue;
            }
        }
        segments.push(Segment::Text(text));
    }

    let queries = multiply(&segments, &replacements);
    if queries.is_empty() {
        warn!(query = %query, "no persistent classes found for query");
    }
    Ok(queries)
}

/// Index of the first token after a leading select clause.
fn select_clause_end(tokens: &[SpannedToken]) -> usize {
    let starts_with_select = tokens
        .iter()
        .find(|t| !t.token.is_whitespace())
        .is_some_and(|t| t.token.is_keyword("select"));
    if !starts_with_select {
        return 0;
    }
    tokens
        .iter()
        .position(|t| t.token.is_keyword("from"))
        .unwrap_or(tokens.len())
}

fn is_possibly_class_name(last: Option<&str>, next: Option<&str>) -> bool {
    let Some(last) = last else {
        return false;
    };
    last == "class"
        || (BEFORE_CLASS_TOKENS.contains(&last)
            && !next.is_some_and(|next| NOT_AFTER_CLASS_TOKENS.contains(&next)))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.')
}

/// Render every combination of replacements; the first placeholder varies
/// slowest.
fn multiply(segments: &[Segment<'_>], replacements: &[Arc<[String]>]) -> Vec<String> {
    let total: usize = replacements.iter().map(|r| r.len()).product();
    let mut queries = Vec::with_capacity(total);
    let mut choice = vec![0usize; replacements.len()];

    for n in 0..total {
        let mut remainder = n;
        for (slot, options) in replacements.iter().enumerate().rev() {
            choice[slot] = remainder % options.len();
            remainder /= options.len();
        }

        let mut query = String::new();
        for segment in segments {
            match segment {
                Segment::Text(text) => query.push_str(text),
                Segment::Placeholder(slot) => query.push_str(&replacements[*slot][choice[*slot]]),
            }
        }
        queries.push(query);
    }

    queries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeDef;
    use crate::error::{CatalogError, Error};
    use pretty_assertions::assert_eq;

    fn zoo() -> EntityCatalog {
        EntityCatalog::builder()
            .with_type(TypeDef::interface("zoo.Named"))
            .unwrap()
            .with_type(TypeDef::interface("zoo.Unmapped"))
            .unwrap()
            .with_type(TypeDef::entity("zoo.Animal", "animal").extends("zoo.Named"))
            .unwrap()
            .with_type(TypeDef::entity("zoo.Dog", "animal").inherits("zoo.Animal"))
            .unwrap()
            .with_type(TypeDef::entity("zoo.Person", "person").extends("zoo.Named"))
            .unwrap()
            .build()
    }

    #[test]
    fn test_single_entity_is_qualified() {
        let queries = concrete_queries("from Dog d where d.name = :name", &zoo()).unwrap();
        assert_eq!(queries, vec!["from zoo.Dog d where d.name = :name"]);
    }

    #[test]
    fn test_interface_expands_to_implementors() {
        let queries = concrete_queries("from zoo.Named n", &zoo()).unwrap();
        assert_eq!(queries, vec!["from zoo.Animal n", "from zoo.Person n"]);
    }

    #[test]
    fn test_cartesian_product_first_placeholder_slowest() {
        let queries = concrete_queries("select n from zoo.Named n, zoo.Named m", &zoo()).unwrap();
        assert_eq!(
            queries,
            vec![
                "select n from zoo.Animal n, zoo.Animal m",
                "select n from zoo.Animal n, zoo.Person m",
                "select n from zoo.Person n, zoo.Animal m",
                "select n from zoo.Person n, zoo.Person m",
            ]
        );
    }

    #[test]
    fn test_select_clause_is_not_rewritten() {
        let queries = concrete_queries("select new Dog(a.name) from Animal a", &zoo()).unwrap();
        assert_eq!(queries, vec!["select new Dog(a.name) from zoo.Animal a"]);
    }

    #[test]
    fn test_string_literals_are_not_rewritten() {
        let queries =
            concrete_queries("from Animal a where a.name = 'from Dog, Dog'", &zoo()).unwrap();
        assert_eq!(
            queries,
            vec!["from zoo.Animal a where a.name = 'from Dog, Dog'"]
        );
    }

    #[test]
    fn test_comma_join_and_subquery() {
        let queries =
            concrete_queries("from Animal a, Person p where p in (select x from Dog x)", &zoo())
                .unwrap();
        assert_eq!(
            queries,
            vec!["from zoo.Animal a, zoo.Person p where p in (select x from zoo.Dog x)"]
        );
    }

    #[test]
    fn test_name_before_in_is_not_rewritten() {
        let queries = concrete_queries("from Animal a, Dog in elements(a.pets)", &zoo()).unwrap();
        assert_eq!(queries, vec!["from zoo.Animal a, Dog in elements(a.pets)"]);
    }

    #[test]
    fn test_update_and_delete_targets() {
        let catalog = zoo();
        assert_eq!(
            concrete_queries("delete Dog where name = 'x'", &catalog).unwrap(),
            vec!["delete zoo.Dog where name = 'x'"]
        );
        assert_eq!(
            concrete_queries("update zoo.Named set name = :n", &catalog).unwrap(),
            vec!["update zoo.Animal set name = :n", "update zoo.Person set name = :n"]
        );
    }

    #[test]
    fn test_whitespace_is_preserved() {
        let queries = concrete_queries("  from\n\tDog   d ", &zoo()).unwrap();
        assert_eq!(queries, vec!["  from\n\tzoo.Dog   d "]);
    }

    #[test]
    fn test_no_implementors_yields_no_queries() {
        let queries = concrete_queries("from zoo.Unmapped u", &zoo()).unwrap();
        assert!(queries.is_empty());
    }

    #[test]
    fn test_empty_query_is_returned_as_is() {
        assert_eq!(concrete_queries("", &zoo()).unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_unknown_names_are_left_alone() {
        let queries = concrete_queries("from Unknown u", &zoo()).unwrap();
        assert_eq!(queries, vec!["from Unknown u"]);
    }

    #[test]
    fn test_ambiguous_import_fails() {
        let catalog = EntityCatalog::builder()
            .with_type(TypeDef::entity("zoo.Cat", "zoo_cat"))
            .unwrap()
            .with_type(TypeDef::entity("farm.Cat", "farm_cat"))
            .unwrap()
            .build();
        let err = concrete_queries("from Cat c", &catalog).unwrap_err();
        assert!(matches!(
            err,
            Error::Catalog(CatalogError::AmbiguousImport { .. })
        ));
    }

    #[test]
    fn test_unterminated_literal_fails() {
        let err = concrete_queries("from Dog d where d.name = 'rex", &zoo()).unwrap_err();
        assert!(matches!(err, Error::Query(QueryError::Lex(_))));
    }

    #[test]
    fn test_identifier_shape() {
        assert!(is_identifier("zoo.Dog"));
        assert!(is_identifier("_x$1"));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a.b="));
    }
}
