//! Type definitions stored in the catalog.

use serde::{Deserialize, Serialize};

/// A named type: a mapped entity, or an unmapped interface/superclass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    /// Fully-qualified type name (e.g. `zoo.Animal`).
    pub name: String,
    /// Direct supertypes: extended classes and implemented interfaces.
    #[serde(default)]
    pub supertypes: Vec<String>,
    /// Entity mapping, when the type is persistent.
    #[serde(default)]
    pub entity: Option<EntityMapping>,
}

/// Persistence mapping of an entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMapping {
    /// Tables this entity reads from.
    #[serde(default)]
    pub query_spaces: Vec<String>,
    /// Only returned by queries naming the entity itself.
    #[serde(default)]
    pub explicit_polymorphism: bool,
    /// Entity this one inherits its mapping from, if any.
    #[serde(default)]
    pub mapped_superclass: Option<String>,
    /// Additional import aliases.
    #[serde(default)]
    pub imports: Vec<String>,
}

impl TypeDef {
    /// Create an unmapped type (interface or plain superclass).
    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            entity: None,
        }
    }

    /// Create a mapped entity reading from the given table.
    pub fn entity(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            entity: Some(EntityMapping {
                query_spaces: vec![table.into()],
                ..EntityMapping::default()
            }),
        }
    }

    /// Add a direct supertype.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Declare the mapped superclass entity (also added as a supertype).
    pub fn inherits(mut self, superclass: impl Into<String>) -> Self {
        let superclass = superclass.into();
        if !self.supertypes.contains(&superclass) {
            self.supertypes.push(superclass.clone());
        }
        if let Some(mapping) = self.entity.as_mut() {
            mapping.mapped_superclass = Some(superclass);
        }
        self
    }

    /// Use explicit polymorphism.
    pub fn explicit(mut self) -> Self {
        if let Some(mapping) = self.entity.as_mut() {
            mapping.explicit_polymorphism = true;
        }
        self
    }

    /// Add an import alias.
    pub fn with_import(mut self, alias: impl Into<String>) -> Self {
        if let Some(mapping) = self.entity.as_mut() {
            mapping.imports.push(alias.into());
        }
        self
    }

    /// Check if this type is a mapped entity.
    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// The unqualified name (text after the last `.`).
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(TypeDef::interface("zoo.model.Animal").short_name(), "Animal");
        assert_eq!(TypeDef::interface("Animal").short_name(), "Animal");
    }

    #[test]
    fn test_inherits_sets_supertype_and_mapping() {
        let dog = TypeDef::entity("zoo.Dog", "dog").inherits("zoo.Animal");
        assert_eq!(dog.supertypes, vec!["zoo.Animal".to_string()]);
        assert_eq!(
            dog.entity.unwrap().mapped_superclass.as_deref(),
            Some("zoo.Animal")
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let def: TypeDef = serde_json::from_str(
            r#"{ "name": "zoo.Dog", "supertypes": ["zoo.Animal"], "entity": { "query_spaces": ["dog"] } }"#,
        )
        .unwrap();
        let mapping = def.entity.unwrap();
        assert!(!mapping.explicit_polymorphism);
        assert!(mapping.mapped_superclass.is_none());
        assert_eq!(mapping.query_spaces, vec!["dog".to_string()]);
    }
}
