use std::collections::HashMap;

use anyhow::{Result, bail};
use docannot::prelude::*;
use docannot::{ConstructorArgs, ConstructorParam, FieldDescriptor, SemanticKind, TypeDescriptor};

/// Host registry that builds every type from a hand-written descriptor.
struct Host {
    types: HashMap<&'static str, TypeDescriptor>,
}

impl Host {
    fn new() -> Self {
        let mut types = HashMap::new();
        types.insert(
            "Orm\\Column",
            TypeDescriptor {
                name: "Orm\\Column".to_string(),
                doc_comment: Some("/** @Annotation @Target({\"PROPERTY\", \"ANNOTATION\"}) */".to_string()),
                fields: vec![
                    FieldDescriptor::new("type").doc("/** @var string */"),
                    FieldDescriptor::new("length").declared("int"),
                    FieldDescriptor::new("nullable")
                        .doc("/** @var bool */")
                        .default_value(Value::Bool(false)),
                ],
                ..TypeDescriptor::default()
            },
        );
        types.insert(
            "Orm\\Index",
            TypeDescriptor {
                name: "Orm\\Index".to_string(),
                doc_comment: Some("/** @Annotation */".to_string()),
                constructor: Some(vec![ConstructorParam::new("values")]),
                ..TypeDescriptor::default()
            },
        );
        types.insert(
            "Orm\\Table",
            TypeDescriptor {
                name: "Orm\\Table".to_string(),
                doc_comment: Some("/** @Annotation @Target(\"CLASS\") */".to_string()),
                fields: vec![
                    FieldDescriptor::new("name").doc("/** @Required @var string */"),
                    FieldDescriptor::new("indexes").doc("/** @var array<Orm\\Index> */"),
                ],
                ..TypeDescriptor::default()
            },
        );
        Self { types }
    }

    fn find(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types
            .values()
            .find(|d| d.name.eq_ignore_ascii_case(name.trim_start_matches('\\')))
    }
}

impl TypeRegistry for Host {
    fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn describe(&self, name: &str) -> Option<TypeDescriptor> {
        self.find(name).cloned()
    }

    fn constant(&self, name: &str) -> Option<Value> {
        match name {
            "Orm\\Column::DEFAULT_LENGTH" => Some(Value::Integer(255)),
            _ => None,
        }
    }

    fn instantiate(&self, name: &str, args: ConstructorArgs) -> Result<Annotation> {
        let Some(descriptor) = self.find(name) else {
            bail!("no such type {}", name);
        };
        let mut instance = Annotation::new(descriptor.name.clone());
        for field in &descriptor.fields {
            instance.set(field.name.clone(), field.default.clone());
        }
        match args {
            ConstructorArgs::Values(values) => {
                if values.is_empty() {
                    bail!("an index needs at least one column");
                }
                instance.set("values", Value::Array(values.into_iter().map(|(_, v)| v).collect()));
            }
            ConstructorArgs::Positional(_) => bail!("unsupported"),
            ConstructorArgs::Empty => {}
        }
        Ok(instance)
    }
}

fn entity_ctx() -> ParserContext {
    ParserContext::new("class App\\User")
        .with_import("orm", "Orm")
        .expect("imports only")
        .with_target(Target::CLASS)
}

#[test]
fn test_host_registry_builds_nested_annotations() -> Result<()> {
    let host = Host::new();
    let cache = MetadataCache::new();
    let parser = DocParser::new(&host, &cache);

    let annotations = parser.parse(
        r#"/**
         * @ORM\Table(name="users", indexes={@ORM\Index({"email"}), @ORM\Index(columns={"name", "age"})})
         */"#,
        &entity_ctx(),
    )?;

    assert_eq!(annotations.len(), 1);
    let table = &annotations[0];
    assert!(table.is("Orm\\Table"));
    assert_eq!(table.get("name"), Some(&Value::from("users")));

    let indexes = table.get("indexes").and_then(Value::as_array).unwrap();
    assert_eq!(indexes.len(), 2);
    assert!(indexes.values().all(|v| v.as_annotation().is_some_and(|a| a.is("Orm\\Index"))));
    Ok(())
}

#[test]
fn test_field_types_from_host_descriptor() -> Result<()> {
    let host = Host::new();
    let cache = MetadataCache::new();
    let parser = DocParser::new(&host, &cache);
    let ctx = entity_ctx().with_description("property App\\User::$email").with_target(Target::PROPERTY);

    let annotations = parser.parse(
        r#"@ORM\Column(type="string", length=ORM\Column::DEFAULT_LENGTH)"#,
        &ctx,
    )?;
    assert_eq!(annotations[0].get("length"), Some(&Value::Integer(255)));
    assert_eq!(annotations[0].get("nullable"), Some(&Value::Bool(false)));

    let err = parser
        .parse(r#"@ORM\Column(type="string", nullable="yes")"#, &ctx)
        .unwrap_err();
    assert_eq!(err.semantic_kind(), Some(SemanticKind::Type));
    assert!(err.message().ends_with("expects a(n) bool, but got string."));

    let err = parser.parse(r#"@ORM\Column(length="long")"#, &ctx).unwrap_err();
    assert!(err.message().contains("expects a(n) int, but got string."));
    Ok(())
}

#[test]
fn test_array_element_types() {
    let host = Host::new();
    let cache = MetadataCache::new();
    let parser = DocParser::new(&host, &cache);

    let err = parser
        .parse(r#"@ORM\Table(name="users", indexes={"email"})"#, &entity_ctx())
        .unwrap_err();
    assert_eq!(
        err.message(),
        "Attribute \"indexes\" of @ORM\\Table declared on class App\\User expects either a(n) Orm\\Index, or an array of Orm\\Indexs, but got string."
    );
}

#[test]
fn test_target_on_class() {
    let host = Host::new();
    let cache = MetadataCache::new();
    let parser = DocParser::new(&host, &cache);

    let err = parser.parse(r#"@ORM\Column(type="string")"#, &entity_ctx()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[Semantical Error] Annotation @ORM\\Column is not allowed to be declared on class App\\User. You may only use this annotation on these code elements: PROPERTY, ANNOTATION."
    );
}

#[test]
fn test_host_failure_is_wrapped() {
    let host = Host::new();
    let cache = MetadataCache::new();
    let parser = DocParser::new(&host, &cache);

    let err = parser.parse(r#"@ORM\Index"#, &entity_ctx()).unwrap_err();
    assert!(err.is_creation());
    assert_eq!(
        err.message(),
        "An error occurred while instantiating the annotation @ORM\\Index declared on class App\\User: \"an index needs at least one column\"."
    );
}
