//! Type metadata registry.
//!
//! Declarations go in through [`RegistryBuilder`] (or a [`SchemaFile`]); the
//! per-type metadata (flattened field list, effective casts and validators)
//! is built lazily on first use and cached under the exact type name.
//!
//! Every declared name gets its own [`OnceCell`] at build time, so the first
//! access initializes exactly one entry even when several threads race for it,
//! and later reads take no lock at all.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::descriptor::{CastSpec, EnumDecl, FieldSpec, TypeDecl, TypeName};
use crate::error::{Error, SchemaError};
use crate::validate::{FieldError, Validator};
use crate::value::Map;

// ------------------------------- Metadata --------------------------------- //

/// Resolved shape of one concrete type, shared by all of its instances.
pub struct TypeMetadata {
    pub type_name: TypeName,
    /// The type itself followed by its ancestors, nearest first.
    pub lineage: Vec<TypeName>,
    /// Base-type fields first, then derived ones, in declaration order.
    pub fields: IndexMap<String, FieldSpec>,
    pub casts: IndexMap<String, CastSpec>,
    /// Validation gates of the whole lineage, base first.
    pub validators: Vec<Arc<dyn Validator>>,
}

impl TypeMetadata {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    pub fn cast(&self, field: &str) -> Option<&CastSpec> {
        self.casts.get(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_subtype_of(&self, name: &TypeName) -> bool {
        self.lineage.contains(name)
    }

    /// Run every gate in the lineage and gather their field errors.
    pub fn validate(&self, data: &Map) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for validator in &self.validators {
            if let Err(found) = validator.validate(data) {
                errors.extend(found);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl std::fmt::Debug for TypeMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("lineage", &self.lineage)
            .field("fields", &self.fields)
            .field("casts", &self.casts)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Serializable summary of a type's metadata, used by `typecast describe`.
#[derive(Debug, Clone, Serialize)]
pub struct TypeSummary {
    pub name: TypeName,
    pub lineage: Vec<TypeName>,
    pub fields: Vec<FieldSpec>,
    pub casts: IndexMap<String, CastSpec>,
    pub validated: bool,
}

impl From<&TypeMetadata> for TypeSummary {
    fn from(meta: &TypeMetadata) -> Self {
        Self {
            name: meta.type_name.clone(),
            lineage: meta.lineage.clone(),
            fields: meta.fields.values().cloned().collect(),
            casts: meta.casts.clone(),
            validated: !meta.validators.is_empty(),
        }
    }
}

// ------------------------------- Registry --------------------------------- //

pub struct Registry {
    types: HashMap<TypeName, TypeDecl>,
    enums: HashMap<TypeName, EnumDecl>,
    metadata: HashMap<TypeName, OnceCell<Arc<TypeMetadata>>>,
    config: Config,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> + '_ {
        self.types.keys()
    }

    pub fn enum_decl(&self, name: &str) -> Option<&EnumDecl> {
        self.enums.get(name)
    }

    /// Metadata for `name`, built on first request and shared afterwards.
    pub fn metadata(&self, name: &str) -> Result<Arc<TypeMetadata>, SchemaError> {
        let cell = self.metadata.get(name).ok_or_else(|| SchemaError::UnknownType(name.into()))?;
        cell.get_or_try_init(|| self.build_metadata(name).map(Arc::new)).cloned()
    }

    fn lineage(&self, name: &str) -> Result<Vec<&TypeDecl>, SchemaError> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut cursor = Some(name);
        while let Some(current) = cursor {
            let decl = self.types.get(current).ok_or_else(|| SchemaError::UnknownType(current.into()))?;
            if !seen.insert(current) {
                return Err(SchemaError::InheritanceCycle(decl.name.clone()));
            }
            chain.push(decl);
            cursor = decl.extends.as_ref().map(TypeName::as_str);
        }
        Ok(chain)
    }

    fn build_metadata(&self, name: &str) -> Result<TypeMetadata, SchemaError> {
        let chain = self.lineage(name)?;

        // root first so base fields keep the leading positions; a redeclared
        // field stays where the base put it but takes the derived descriptor
        let mut fields = IndexMap::new();
        for decl in chain.iter().rev() {
            for spec in &decl.fields {
                fields.insert(spec.name.clone(), spec.clone());
            }
        }

        let casts = chain.iter()
            .find_map(|d| d.casts.clone())
            .unwrap_or_default();
        // gates add up: a derived type still enforces its ancestors' rules
        let validators = chain.iter().rev().filter_map(|d| d.validator.clone()).collect();

        let meta = TypeMetadata {
            type_name: chain[0].name.clone(),
            lineage: chain.iter().map(|d| d.name.clone()).collect(),
            fields,
            casts,
            validators,
        };
        tracing::debug!(
            type_name = %meta.type_name,
            fields = meta.fields.len(),
            casts = meta.casts.len(),
            "built type metadata"
        );
        Ok(meta)
    }

    /// Parse a JSON schema document and build a registry from it.
    pub fn from_schema_str(src: &str) -> Result<Self, Error> {
        let schema: SchemaFile = crate::path_de::from_str_with_path(src)?;
        Ok(schema.into_builder().build()?)
    }

    pub fn from_schema_slice(bytes: &[u8]) -> Result<Self, Error> {
        let schema: SchemaFile = crate::path_de::from_slice_with_path(bytes)?;
        Ok(schema.into_builder().build()?)
    }

    /// Make this registry the process-wide one. Only the first call wins.
    pub fn install(self) -> Result<&'static Registry, SchemaError> {
        GLOBAL.try_insert(self).map_err(|_| SchemaError::GlobalAlreadyInstalled)
    }
}

static GLOBAL: OnceCell<Registry> = OnceCell::new();

/// The process-wide registry, if one was installed.
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}

// ------------------------------- Builder ---------------------------------- //

#[derive(Default)]
pub struct RegistryBuilder {
    types: Vec<TypeDecl>,
    enums: Vec<EnumDecl>,
    config: Config,
}

impl RegistryBuilder {
    pub fn register(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }

    pub fn enumeration(mut self, decl: EnumDecl) -> Self {
        self.enums.push(decl);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Check every cross-reference and freeze the declarations.
    pub fn build(self) -> Result<Registry, SchemaError> {
        let mut types = HashMap::with_capacity(self.types.len());
        for decl in self.types {
            if types.contains_key(&decl.name) {
                return Err(SchemaError::DuplicateType(decl.name));
            }
            types.insert(decl.name.clone(), decl);
        }
        let mut enums = HashMap::with_capacity(self.enums.len());
        for decl in self.enums {
            if enums.contains_key(&decl.name) || types.contains_key(&decl.name) {
                return Err(SchemaError::DuplicateType(decl.name));
            }
            enums.insert(decl.name.clone(), decl);
        }

        let metadata = types.keys().map(|k| (k.clone(), OnceCell::new())).collect();
        let registry = Registry { types, enums, metadata, config: self.config };
        registry.check_references()?;
        Ok(registry)
    }
}

impl Registry {
    fn check_references(&self) -> Result<(), SchemaError> {
        for decl in self.types.values() {
            let chain = self.lineage(decl.name.as_str())?;

            let mut refs = Vec::new();
            for spec in &decl.fields {
                if matches!(&spec.descriptor, crate::descriptor::TypeDescriptor::Union(alts) if alts.is_empty()) {
                    return Err(SchemaError::EmptyUnion { type_name: decl.name.clone(), field: spec.name.clone() });
                }
                spec.descriptor.referenced_names(&mut refs);
            }
            for (name, is_enum) in refs {
                if is_enum && !self.enums.contains_key(&name) {
                    return Err(SchemaError::UnknownEnum(name));
                }
                if !is_enum && !self.types.contains_key(&name) {
                    return Err(SchemaError::UnknownType(name));
                }
            }

            if let Some(casts) = &decl.casts {
                let declared: HashSet<&str> = chain.iter()
                    .flat_map(|d| d.fields.iter().map(|f| f.name.as_str()))
                    .collect();
                for (field, cast) in casts {
                    if !declared.contains(field.as_str()) {
                        return Err(SchemaError::CastOnUnknownField {
                            type_name: decl.name.clone(),
                            field: field.clone(),
                        });
                    }
                    if !self.types.contains_key(&cast.target) {
                        return Err(SchemaError::UnknownType(cast.target.clone()));
                    }
                }
            }
        }
        Ok(())
    }
}

// ------------------------------ Schema file ------------------------------- //

/// On-disk declaration set. Validators cannot be expressed here; attach them
/// with the builder instead.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaFile {
    pub types: Vec<TypeDecl>,
    pub enums: Vec<EnumDecl>,
    pub config: Config,
}

impl SchemaFile {
    pub fn into_builder(self) -> RegistryBuilder {
        RegistryBuilder { types: self.types, enums: self.enums, config: self.config }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{CastSpec, EnumDecl, TypeDescriptor as D};
    use crate::validate::Required;

    fn base_and_child() -> Registry {
        Registry::builder()
            .register(
                TypeDecl::new("BaseDTO")
                    .field("id", D::int())
                    .field("label", D::string())
                    .validator(Required::fields(["id"])),
            )
            .register(
                TypeDecl::new("ChildDTO")
                    .extends("BaseDTO")
                    .field("childField", D::string())
                    .field("label", D::union([D::string(), D::int()]))
                    .validator(|_: &Map| -> Result<(), Vec<FieldError>> {
                        Err(vec![FieldError::new("childField", "child rule")])
                    }),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn base_fields_precede_derived_fields() {
        let reg = base_and_child();
        let meta = reg.metadata("ChildDTO").unwrap();
        let names: Vec<_> = meta.field_names().collect();
        assert_eq!(names, vec!["id", "label", "childField"]);
        // redeclared field keeps base position with the derived descriptor
        assert_eq!(meta.field("label").unwrap().descriptor, D::union([D::string(), D::int()]));
        assert_eq!(meta.lineage, vec![TypeName::from("ChildDTO"), TypeName::from("BaseDTO")]);
    }

    #[test]
    fn metadata_is_cached_per_type() {
        let reg = base_and_child();
        let a = reg.metadata("BaseDTO").unwrap();
        let b = reg.metadata("BaseDTO").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let child = reg.metadata("ChildDTO").unwrap();
        assert!(!Arc::ptr_eq(&a, &child));
        assert_eq!(a.fields.len(), 2);
        assert!(a.field("childField").is_none());
    }

    #[test]
    fn validators_accumulate_down_the_lineage_only() {
        let reg = base_and_child();
        let mut data = Map::new();
        data.insert("id".into(), 1i64.into());
        // base first, then child, then base again
        let base = reg.metadata("BaseDTO").unwrap();
        assert_eq!(base.validators.len(), 1);
        assert!(base.validate(&data).is_ok());
        let child = reg.metadata("ChildDTO").unwrap();
        assert_eq!(child.validators.len(), 2);
        assert!(child.validate(&data).is_err());
        let base = reg.metadata("BaseDTO").unwrap();
        assert!(base.validate(&data).is_ok());

        // the child reports the base rule ahead of its own
        let errors = child.validate(&Map::new()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["id", "childField"]);
    }

    #[test]
    fn casts_are_inherited_unless_redeclared() {
        let reg = Registry::builder()
            .register(TypeDecl::new("Item").field("sku", D::string()))
            .register(TypeDecl::new("Base").field("items", D::array()).cast("items", CastSpec::sequence("Item")))
            .register(TypeDecl::new("Inherits").extends("Base"))
            .register(TypeDecl::new("Overrides").extends("Base").no_casts())
            .build()
            .unwrap();
        assert!(reg.metadata("Inherits").unwrap().cast("items").is_some());
        assert!(reg.metadata("Overrides").unwrap().cast("items").is_none());
    }

    #[test]
    fn unknown_type_is_an_error() {
        let reg = base_and_child();
        assert_eq!(reg.metadata("Nope").unwrap_err(), SchemaError::UnknownType("Nope".into()));
    }

    #[test]
    fn build_rejects_bad_declarations() {
        let dup = Registry::builder()
            .register(TypeDecl::new("A"))
            .register(TypeDecl::new("A"))
            .build();
        assert!(matches!(dup, Err(SchemaError::DuplicateType(_))));

        let cycle = Registry::builder()
            .register(TypeDecl::new("A").extends("B"))
            .register(TypeDecl::new("B").extends("A"))
            .build();
        assert!(matches!(cycle, Err(SchemaError::InheritanceCycle(_))));

        let missing_enum = Registry::builder()
            .register(TypeDecl::new("A").field("s", D::enumeration("Status")))
            .build();
        assert_eq!(missing_enum.err(), Some(SchemaError::UnknownEnum("Status".into())));

        let stray_cast = Registry::builder()
            .register(TypeDecl::new("A").cast("ghost", CastSpec::single("A")))
            .build();
        assert!(matches!(stray_cast, Err(SchemaError::CastOnUnknownField { .. })));

        let empty_union = Registry::builder()
            .register(TypeDecl::new("A").field("u", D::union([])))
            .build();
        assert!(matches!(empty_union, Err(SchemaError::EmptyUnion { .. })));
    }

    #[test]
    fn concurrent_first_access_builds_once() {
        use rayon::prelude::*;
        let reg = base_and_child();
        let metas: Vec<Arc<TypeMetadata>> = (0..256)
            .into_par_iter()
            .map(|_| reg.metadata("ChildDTO").unwrap())
            .collect();
        assert!(metas.iter().all(|m| Arc::ptr_eq(m, &metas[0])));
    }

    #[test]
    fn schema_file_loads_types_enums_and_config() {
        let src = r#"{
            "config": {"max_depth": 8},
            "enums": [{"name": "Status", "cases": [{"name": "Active", "value": "active"}]}],
            "types": [
                {"name": "Task", "fields": [
                    {"name": "title", "type": {"scalar": "string"}},
                    {"name": "status", "type": {"enum": "Status"}, "nullable": true}
                ]}
            ]
        }"#;
        let reg = Registry::from_schema_str(src).unwrap();
        assert_eq!(reg.config().max_depth, 8);
        assert!(reg.enum_decl("Status").is_some());
        let meta = reg.metadata("Task").unwrap();
        assert!(meta.field("status").unwrap().nullable);
    }

    #[test]
    fn schema_errors_report_json_path() {
        let src = r#"{"types": [{"name": "Task", "fields": [{"name": "x", "type": {"scalar": "decimal"}}]}]}"#;
        let err = Registry::from_schema_str(src).err().unwrap();
        match err {
            Error::Json { path, .. } => assert!(path.starts_with("types[0].fields[0].type"), "{path}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn summary_lists_resolved_fields() {
        let reg = base_and_child();
        let summary = TypeSummary::from(&*reg.metadata("ChildDTO").unwrap());
        assert_eq!(summary.fields.len(), 3);
        assert!(summary.validated);
        let enum_reg = Registry::builder().enumeration(EnumDecl::new("E").case("A", 1)).build().unwrap();
        assert_eq!(enum_reg.enum_decl("E").unwrap().cases.len(), 1);
    }
}
