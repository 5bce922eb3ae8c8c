//! `.proto` parsing into a [`DescriptorPool`].
//!
//! Parsing is delegated to `protobuf_parse` (pure Rust parser, no `protoc`),
//! which yields `FileDescriptorProto`s. This module flattens those into the
//! codec's own descriptor types, resolving every type reference to a fully
//! qualified name and deriving cardinality, packing and presence per field.

use crate::Result;
use proto_types::{
    Cardinality, DescriptorPool, EnumDescriptor, EnumValueDescriptor, FieldDescriptor,
    MessageDescriptor, Presence, ProtoType, SchemaError, Syntax, MAX_FIELD_NUMBER,
};
use protobuf::descriptor::field_descriptor_proto::{Label, Type};
use protobuf::descriptor::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
};
use protobuf_parse::Parser;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name used when a text schema does not carry one.
const DEFAULT_SCHEMA_FILE_NAME: &str = "schema.proto";

/// Parse a .proto file and build a descriptor pool.
///
/// Imports are resolved relative to the file's directory, then the current
/// working directory.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<DescriptorPool> {
    parse_file_with_includes(path, &[])
}

/// Parse a .proto file, resolving imports against the file's directory,
/// then each of `include_paths` in order, then the current working directory.
///
/// Root-relative imports such as `import "example/v1/region.proto"` need the
/// directory that contains `example/` among those roots.
pub fn parse_file_with_includes<P: AsRef<Path>>(
    path: P,
    include_paths: &[PathBuf],
) -> Result<DescriptorPool> {
    let p = path.as_ref();

    std::fs::metadata(p).map_err(|source| SchemaError::Io {
        path: p.to_path_buf(),
        source,
    })?;

    let parent = match p.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    // the input file must resolve against the first root
    let mut includes: Vec<PathBuf> = Vec::with_capacity(include_paths.len() + 2);
    for include in std::iter::once(parent)
        .chain(include_paths.iter().cloned())
        .chain(std::iter::once(PathBuf::from(".")))
    {
        if !includes.contains(&include) {
            includes.push(include);
        }
    }

    debug!("Parsing proto schema {} (imports from {:?})", p.display(), includes);

    let mut parser = Parser::new();
    parser.pure();
    for include in &includes {
        parser.include(include);
    }
    parser.input(p);

    let parsed = parser
        .parse_and_typecheck()
        .map_err(|e| SchemaError::Parse(format!("{e:#}")))?;

    let file_name = p.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    build_pool(&parsed.file_descriptors, file_name)
}

/// Parse .proto content from a string.
///
/// The content is written to a temporary directory under `file_name` (or
/// `schema.proto`) because the parser works on files.
pub fn parse_str(content: &str, file_name: Option<&str>) -> Result<DescriptorPool> {
    let dir = tempfile::tempdir().map_err(|source| SchemaError::Io {
        path: std::env::temp_dir(),
        source,
    })?;

    let file_name = file_name
        .and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or(DEFAULT_SCHEMA_FILE_NAME);
    let path = dir.path().join(file_name);

    std::fs::write(&path, content).map_err(|source| SchemaError::Io {
        path: path.clone(),
        source,
    })?;

    parse_file(&path)
}

/// Build one pool from the parsed files.
///
/// Every file's types are added so references into imported files resolve;
/// the file named `main_file` (or the last one) supplies package and syntax.
fn build_pool(files: &[FileDescriptorProto], main_file: &str) -> Result<DescriptorPool> {
    let main = files
        .iter()
        .find(|f| {
            f.name
                .as_deref()
                .is_some_and(|n| Path::new(n).file_name().and_then(|n| n.to_str()) == Some(main_file))
        })
        .or_else(|| files.last())
        .ok_or_else(|| SchemaError::Parse("no protobuf files were parsed".to_string()))?;

    let mut index = TypeIndex::default();
    for file in files {
        let scope = file.package.clone().unwrap_or_default();
        for message in &file.message_type {
            index.collect_message(&scope, message);
        }
        for enum_type in &file.enum_type {
            index.enums.insert(join_name(&scope, enum_type.name.as_deref().unwrap_or_default()));
        }
    }

    let mut pool = DescriptorPool::new(
        main.package.clone().filter(|p| !p.is_empty()),
        file_syntax(main),
    );

    for file in files {
        let scope = file.package.clone().unwrap_or_default();
        let syntax = file_syntax(file);
        for message in &file.message_type {
            build_message(&mut pool, &index, &scope, message, syntax)?;
        }
        for enum_type in &file.enum_type {
            pool.add_enum(build_enum(&scope, enum_type, syntax));
        }
    }

    debug!(
        "Built descriptor pool with {} message types",
        pool.list_messages().len()
    );

    Ok(pool)
}

fn file_syntax(file: &FileDescriptorProto) -> Syntax {
    match file.syntax.as_deref() {
        Some("proto3") => Syntax::Proto3,
        _ => Syntax::Proto2,
    }
}

fn join_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}

/// A resolved type reference.
enum TypeRef {
    Message(String),
    Enum(String),
}

/// Names of every message and enum, used to resolve references.
#[derive(Default)]
struct TypeIndex {
    messages: HashSet<String>,
    map_entries: HashSet<String>,
    enums: HashSet<String>,
}

impl TypeIndex {
    fn collect_message(&mut self, scope: &str, message: &DescriptorProto) {
        let full_name = join_name(scope, message.name.as_deref().unwrap_or_default());

        let is_map_entry = message
            .options
            .as_ref()
            .and_then(|o| o.map_entry)
            .unwrap_or(false);
        if is_map_entry {
            self.map_entries.insert(full_name.clone());
        }

        for nested in &message.nested_type {
            self.collect_message(&full_name, nested);
        }
        for enum_type in &message.enum_type {
            self.enums
                .insert(join_name(&full_name, enum_type.name.as_deref().unwrap_or_default()));
        }
        self.messages.insert(full_name);
    }

    /// Resolve `type_name` as seen from inside message `scope`.
    ///
    /// Fully qualified names start with a dot. Relative names are searched
    /// from the innermost scope outwards.
    fn resolve(&self, scope: &str, type_name: &str) -> Option<TypeRef> {
        if let Some(full) = type_name.strip_prefix('.') {
            return self.lookup(full);
        }

        let mut current = scope;
        loop {
            let candidate = join_name(current, type_name);
            if let Some(found) = self.lookup(&candidate) {
                return Some(found);
            }
            if current.is_empty() {
                return None;
            }
            current = current.rsplit_once('.').map(|(parent, _)| parent).unwrap_or("");
        }
    }

    fn lookup(&self, full_name: &str) -> Option<TypeRef> {
        if self.messages.contains(full_name) {
            Some(TypeRef::Message(full_name.to_string()))
        } else if self.enums.contains(full_name) {
            Some(TypeRef::Enum(full_name.to_string()))
        } else {
            None
        }
    }
}

fn build_message(
    pool: &mut DescriptorPool,
    index: &TypeIndex,
    scope: &str,
    message: &DescriptorProto,
    syntax: Syntax,
) -> Result<()> {
    let full_name = join_name(scope, message.name.as_deref().unwrap_or_default());

    // Synthetic oneofs created for proto3 `optional` fields are not real oneofs.
    let mut real_oneofs: HashMap<i32, usize> = HashMap::new();
    let mut oneof_names = Vec::new();
    for field in &message.field {
        if field.proto3_optional.unwrap_or(false) {
            continue;
        }
        if let Some(oneof) = field.oneof_index {
            if let std::collections::hash_map::Entry::Vacant(slot) = real_oneofs.entry(oneof) {
                slot.insert(oneof_names.len());
                let name = usize::try_from(oneof)
                    .ok()
                    .and_then(|i| message.oneof_decl.get(i))
                    .and_then(|o| o.name.clone())
                    .unwrap_or_default();
                oneof_names.push(name);
            }
        }
    }

    let mut fields = Vec::with_capacity(message.field.len());
    for field in &message.field {
        let field_name = field.name.clone().unwrap_or_default();
        if field_name.is_empty() {
            continue;
        }
        fields.push(build_field(index, &full_name, field_name, field, syntax, &real_oneofs)?);
    }

    let mut descriptor = MessageDescriptor::new(full_name.clone(), fields)?;
    descriptor.oneofs = oneof_names;
    descriptor.map_entry = index.map_entries.contains(&full_name);
    descriptor.nested_messages = message
        .nested_type
        .iter()
        .map(|n| join_name(&full_name, n.name.as_deref().unwrap_or_default()))
        .collect();
    descriptor.nested_enums = message
        .enum_type
        .iter()
        .map(|e| join_name(&full_name, e.name.as_deref().unwrap_or_default()))
        .collect();
    pool.add_message(descriptor);

    for nested in &message.nested_type {
        build_message(pool, index, &full_name, nested, syntax)?;
    }
    for enum_type in &message.enum_type {
        pool.add_enum(build_enum(&full_name, enum_type, syntax));
    }

    Ok(())
}

fn build_field(
    index: &TypeIndex,
    message_name: &str,
    field_name: String,
    field: &FieldDescriptorProto,
    syntax: Syntax,
    real_oneofs: &HashMap<i32, usize>,
) -> Result<FieldDescriptor> {
    let raw_number = field.number.unwrap_or(0);
    let number = u32::try_from(raw_number)
        .ok()
        .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
        .ok_or_else(|| {
            SchemaError::Parse(format!(
                "Invalid field number {raw_number} for {message_name}.{field_name}"
            ))
        })?;

    let field_type = parse_field_type(index, message_name, &field_name, field)?;

    let label = field
        .label
        .map(|l| l.enum_value_or_default())
        .unwrap_or(Label::LABEL_OPTIONAL);

    let cardinality = match (label, &field_type) {
        (Label::LABEL_REPEATED, ProtoType::Message(entry)) if index.map_entries.contains(entry) => {
            Cardinality::Map
        }
        (Label::LABEL_REPEATED, _) => Cardinality::Repeated,
        (Label::LABEL_REQUIRED, _) => Cardinality::Required,
        _ => Cardinality::Optional,
    };

    let packed = cardinality == Cardinality::Repeated
        && field_type.is_packable()
        && field
            .options
            .as_ref()
            .and_then(|o| o.packed)
            .unwrap_or(syntax == Syntax::Proto3);

    let proto3_optional = field.proto3_optional.unwrap_or(false);
    let oneof_index = if proto3_optional {
        None
    } else {
        field.oneof_index.and_then(|i| real_oneofs.get(&i).copied())
    };

    let presence = if syntax == Syntax::Proto2
        || proto3_optional
        || oneof_index.is_some()
        || matches!(field_type, ProtoType::Message(_))
    {
        Presence::Explicit
    } else {
        Presence::Implicit
    };

    let json_name = field
        .json_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| to_json_name(&field_name));

    Ok(FieldDescriptor {
        name: field_name,
        json_name,
        number,
        field_type,
        cardinality,
        packed,
        presence,
        oneof_index,
    })
}

fn parse_field_type(
    index: &TypeIndex,
    message_name: &str,
    field_name: &str,
    field: &FieldDescriptorProto,
) -> Result<ProtoType> {
    let type_name = field.type_name.as_deref().unwrap_or_default();

    let resolve = || {
        index
            .resolve(message_name, type_name)
            .ok_or_else(|| SchemaError::UnresolvedType {
                message: message_name.to_string(),
                field: field_name.to_string(),
                type_name: type_name.to_string(),
            })
    };

    let Some(field_type) = field.type_ else {
        // Before type checking, message and enum references carry only a name.
        if type_name.is_empty() {
            return Err(SchemaError::Parse(format!(
                "Field {message_name}.{field_name} is missing a type"
            )));
        }
        return Ok(match resolve()? {
            TypeRef::Message(name) => ProtoType::Message(name),
            TypeRef::Enum(name) => ProtoType::Enum(name),
        });
    };

    Ok(match field_type.enum_value_or_default() {
        Type::TYPE_DOUBLE => ProtoType::Double,
        Type::TYPE_FLOAT => ProtoType::Float,
        Type::TYPE_INT64 => ProtoType::Int64,
        Type::TYPE_UINT64 => ProtoType::Uint64,
        Type::TYPE_INT32 => ProtoType::Int32,
        Type::TYPE_FIXED64 => ProtoType::Fixed64,
        Type::TYPE_FIXED32 => ProtoType::Fixed32,
        Type::TYPE_BOOL => ProtoType::Bool,
        Type::TYPE_STRING => ProtoType::String,
        Type::TYPE_BYTES => ProtoType::Bytes,
        Type::TYPE_UINT32 => ProtoType::Uint32,
        Type::TYPE_SFIXED32 => ProtoType::Sfixed32,
        Type::TYPE_SFIXED64 => ProtoType::Sfixed64,
        Type::TYPE_SINT32 => ProtoType::Sint32,
        Type::TYPE_SINT64 => ProtoType::Sint64,
        Type::TYPE_MESSAGE => match resolve()? {
            TypeRef::Message(name) => ProtoType::Message(name),
            TypeRef::Enum(_) => {
                return Err(SchemaError::UnresolvedType {
                    message: message_name.to_string(),
                    field: field_name.to_string(),
                    type_name: type_name.to_string(),
                })
            }
        },
        Type::TYPE_ENUM => match resolve()? {
            TypeRef::Enum(name) => ProtoType::Enum(name),
            TypeRef::Message(_) => {
                return Err(SchemaError::UnresolvedType {
                    message: message_name.to_string(),
                    field: field_name.to_string(),
                    type_name: type_name.to_string(),
                })
            }
        },
        Type::TYPE_GROUP => {
            return Err(SchemaError::UnsupportedGroup {
                message: message_name.to_string(),
                field: field_name.to_string(),
            })
        }
    })
}

fn build_enum(scope: &str, enum_type: &EnumDescriptorProto, syntax: Syntax) -> EnumDescriptor {
    EnumDescriptor {
        name: join_name(scope, enum_type.name.as_deref().unwrap_or_default()),
        values: enum_type
            .value
            .iter()
            .map(|v| EnumValueDescriptor {
                name: v.name.clone().unwrap_or_default(),
                number: v.number.unwrap_or(0),
            })
            .collect(),
        closed: syntax == Syntax::Proto2,
    }
}

/// lowerCamelCase form of a field name (`country_code` → `countryCode`).
pub fn to_json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_message() {
        let proto = r#"
            syntax = "proto3";

            message User {
                string name = 1;
                int32 age = 2;
                bool active = 3;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        assert_eq!(pool.syntax, Syntax::Proto3);

        let user_msg = pool.get_message("User").expect("User message not found");
        assert_eq!(user_msg.fields().len(), 3);

        let name_field = user_msg.get_field("name").expect("name field not found");
        assert_eq!(name_field.number, 1);
        assert_eq!(name_field.field_type, ProtoType::String);
        assert_eq!(name_field.cardinality, Cardinality::Optional);
        assert_eq!(name_field.presence, Presence::Implicit);

        let age_field = user_msg.get_field("age").expect("age field not found");
        assert_eq!(age_field.field_type, ProtoType::Int32);
        assert_eq!(age_field.number, 2);
    }

    #[test]
    fn test_parse_with_package() {
        let proto = r#"
            syntax = "proto3";
            package myapp.v1;

            message Product {
                string id = 1;
                double price = 2;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        assert_eq!(pool.package.as_deref(), Some("myapp.v1"));
        assert!(pool.get_message("Product").is_none());

        let product_msg = pool
            .get_message("myapp.v1.Product")
            .expect("Product message not found");
        assert_eq!(product_msg.short_name(), "Product");
        assert_eq!(
            product_msg.get_field("price").unwrap().field_type,
            ProtoType::Double
        );
    }

    #[test]
    fn test_parse_repeated_fields_packing() {
        let proto = r#"
            syntax = "proto3";

            message Team {
                string name = 1;
                repeated string members = 2;
                repeated int64 scores = 3;
                repeated int32 unpacked = 4 [packed = false];
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        let team = pool.get_message("Team").expect("Team message not found");

        let members = team.get_field("members").unwrap();
        assert!(members.is_repeated());
        assert!(!members.packed);

        let scores = team.get_field("scores").unwrap();
        assert!(scores.is_repeated());
        assert!(scores.packed);

        assert!(!team.get_field("unpacked").unwrap().packed);
    }

    #[test]
    fn test_parse_proto2_labels() {
        let proto = r#"
            syntax = "proto2";

            message Legacy {
                required string id = 1;
                optional int32 count = 2;
                repeated int32 values = 3;
                repeated int32 packed_values = 4 [packed = true];
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        assert_eq!(pool.syntax, Syntax::Proto2);

        let legacy = pool.get_message("Legacy").unwrap();
        assert!(legacy.get_field("id").unwrap().is_required());
        let count = legacy.get_field("count").unwrap();
        assert_eq!(count.cardinality, Cardinality::Optional);
        assert_eq!(count.presence, Presence::Explicit);
        assert!(!legacy.get_field("values").unwrap().packed);
        assert!(legacy.get_field("packed_values").unwrap().packed);
    }

    #[test]
    fn test_parse_nested_types() {
        let proto = r#"
            syntax = "proto3";
            package geo;

            message Outer {
                message Inner {
                    enum Kind {
                        KIND_UNSPECIFIED = 0;
                        KIND_CITY = 1;
                    }
                    string label = 1;
                    Kind kind = 2;
                }
                Inner inner = 1;
                repeated Inner items = 2;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        let outer = pool.get_message("geo.Outer").unwrap();
        assert_eq!(outer.nested_messages, vec!["geo.Outer.Inner".to_string()]);
        assert_eq!(
            outer.get_field("inner").unwrap().field_type,
            ProtoType::Message("geo.Outer.Inner".to_string())
        );
        assert_eq!(
            outer.get_field("inner").unwrap().presence,
            Presence::Explicit
        );

        let inner = pool.get_message("geo.Outer.Inner").unwrap();
        assert_eq!(
            inner.get_field("kind").unwrap().field_type,
            ProtoType::Enum("geo.Outer.Inner.Kind".to_string())
        );

        let kind = pool.get_enum("geo.Outer.Inner.Kind").unwrap();
        assert!(!kind.closed);
        assert_eq!(kind.value_by_name("KIND_CITY").unwrap().number, 1);
    }

    #[test]
    fn test_parse_map_field() {
        let proto = r#"
            syntax = "proto3";

            message Inventory {
                map<string, int32> counts = 1;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        let inventory = pool.get_message("Inventory").unwrap();
        let counts = inventory.get_field("counts").unwrap();
        assert!(counts.is_map());

        let ProtoType::Message(entry_name) = &counts.field_type else {
            panic!("Expected map entry message type");
        };
        let entry = pool.get_message(entry_name).unwrap();
        assert!(entry.map_entry);
        assert_eq!(entry.map_key().unwrap().field_type, ProtoType::String);
        assert_eq!(entry.map_value().unwrap().field_type, ProtoType::Int32);
    }

    #[test]
    fn test_parse_oneof_and_optional() {
        let proto = r#"
            syntax = "proto3";

            message Contact {
                oneof channel {
                    string email = 1;
                    string phone = 2;
                }
                optional int32 priority = 3;
                int32 weight = 4;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        let contact = pool.get_message("Contact").unwrap();

        assert_eq!(contact.oneofs, vec!["channel".to_string()]);
        let email = contact.get_field("email").unwrap();
        assert_eq!(email.oneof_index, Some(0));
        assert_eq!(email.presence, Presence::Explicit);
        assert_eq!(contact.oneof_members(0).count(), 2);

        let priority = contact.get_field("priority").unwrap();
        assert_eq!(priority.oneof_index, None);
        assert_eq!(priority.presence, Presence::Explicit);

        assert_eq!(
            contact.get_field("weight").unwrap().presence,
            Presence::Implicit
        );
    }

    #[test]
    fn test_parse_field_order_and_json_name() {
        let proto = r#"
            syntax = "proto3";

            message OrderedMessage {
                string field_a = 3;
                int32 field_b = 1;
                bool country_code = 2;
            }
        "#;

        let pool = parse_str(proto, None).expect("Failed to parse proto");
        let msg = pool.get_message("OrderedMessage").unwrap();
        assert_eq!(msg.list_fields(), vec!["field_a", "field_b", "country_code"]);
        assert_eq!(msg.get_field("country_code").unwrap().json_name, "countryCode");
    }

    #[test]
    fn test_parse_invalid_proto() {
        let proto = r#"
            syntax = "proto3";

            message InvalidMessage {
                string name
            }
        "#;

        let result = parse_str(proto, None);
        assert!(matches!(result, Err(SchemaError::Parse(_))));
    }

    #[test]
    fn test_parse_duplicate_field_number() {
        let proto = r#"
            syntax = "proto3";

            message Dup {
                string a = 1;
                string b = 1;
            }
        "#;

        // rejected by the parser's own type check
        let err = parse_str(proto, None).unwrap_err();
        assert!(
            matches!(&err, SchemaError::Parse(msg) if msg.contains("Non-unique field")),
            "{err}"
        );
    }

    #[test]
    fn test_parse_unresolved_type() {
        let proto = r#"
            syntax = "proto3";

            message Holder {
                Missing missing = 1;
            }
        "#;

        let err = parse_str(proto, None).unwrap_err();
        assert!(
            matches!(&err, SchemaError::Parse(msg) if msg.contains("Missing")),
            "{err}"
        );
    }

    fn write_rooted_tree(root: &Path) -> PathBuf {
        let dir = root.join("example").join("v1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("region.proto"),
            r#"
                syntax = "proto3";
                package example.v1;
                enum Region { REGION_UNSPECIFIED = 0; REGION_EUROPE = 1; }
            "#,
        )
        .unwrap();

        let main = dir.join("city.proto");
        std::fs::write(
            &main,
            r#"
                syntax = "proto3";
                package example.v1;
                import "example/v1/region.proto";
                message City { string name = 1; Region region = 2; }
            "#,
        )
        .unwrap();
        main
    }

    #[test]
    fn test_parse_root_relative_import() {
        let root = tempfile::tempdir().unwrap();
        let main = write_rooted_tree(root.path());

        let pool = parse_file_with_includes(&main, &[root.path().to_path_buf()]).unwrap();
        let city = pool.get_message("example.v1.City").unwrap();
        assert_eq!(
            city.get_field("region").unwrap().field_type,
            ProtoType::Enum("example.v1.Region".to_string())
        );
        assert!(pool.get_enum("example.v1.Region").is_some());
    }

    #[test]
    fn test_root_relative_import_needs_root() {
        let root = tempfile::tempdir().unwrap();
        let main = write_rooted_tree(root.path());

        let err = parse_file(&main).unwrap_err();
        assert!(
            matches!(&err, SchemaError::Parse(msg) if msg.contains("example/v1/region.proto")),
            "{err}"
        );
    }

    #[test]
    fn test_parse_missing_file() {
        let result = parse_file("/definitely/not/here.proto");
        assert!(matches!(result, Err(SchemaError::Io { .. })));
    }

    #[test]
    fn test_to_json_name() {
        assert_eq!(to_json_name("name"), "name");
        assert_eq!(to_json_name("country_code"), "countryCode");
        assert_eq!(to_json_name("a_b_c"), "aBC");
    }
}
