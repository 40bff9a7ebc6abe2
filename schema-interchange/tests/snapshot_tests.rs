//! Snapshot tests for generated output.

use schema_ast::{filters, Annotations, Ast, AstKind, Element, PropertySignature, UnionMode};
use schema_interchange::{extract, to_code, to_json, to_json_schema, JsonSchemaConfig, RenderOptions};

fn category() -> Ast {
    Ast::recursive(|this| {
        Ast::object(vec![
            PropertySignature::new("name", Ast::string()),
            PropertySignature::new("children", Ast::array(this)),
        ])
        .identified("Category")
    })
}

fn user() -> Ast {
    let id = Ast::string()
        .check(filters::min_length(1))
        .identified("UserId");
    let role = Ast::new(AstKind::Union {
        types: vec![Ast::literal("admin"), Ast::literal("user")],
        mode: UnionMode::OneOf,
    });
    Ast::object(vec![
        PropertySignature::new("id", id.clone()),
        PropertySignature::new(
            "age",
            Ast::number()
                .check(filters::int())
                .check(filters::between(0.0, 150.0)),
        )
        .optional(),
        PropertySignature::new("role", role),
        PropertySignature::new(
            "pair",
            Ast::tuple(vec![
                Element::required(id),
                Element::optional(Ast::boolean()),
            ]),
        ),
    ])
    .annotate(Annotations::identified("User").with_title("A user"))
}

// =============================================================================
// Code rendering
// =============================================================================

#[test]
fn test_snapshot_recursive_code() {
    let document = extract(&category()).unwrap();
    let generated = to_code(&document, &RenderOptions::default()).unwrap();
    insta::assert_snapshot!(generated.code.trim_end(), @r#"
const Category = Schema.Struct({ "name": Schema.String, "children": Schema.Array(Schema.suspend(() => Category)) }).annotate({ identifier: "Category" });
const schema = Category;
"#);
}

#[test]
fn test_snapshot_user_code() {
    let document = extract(&user()).unwrap();
    let generated = to_code(&document, &RenderOptions::default()).unwrap();
    insta::assert_snapshot!(generated.code.trim_end(), @r#"
const UserId = Schema.String.annotate({ identifier: "UserId" }).check(Schema.isMinLength(1));
const User = Schema.Struct({ "id": UserId, "age": Schema.optionalKey(Schema.Number.check(Schema.isInt()).check(Schema.isBetween(0, 150))), "role": Schema.Union([Schema.Literal("admin"), Schema.Literal("user")], { mode: "oneOf" }), "pair": Schema.Tuple([UserId, Schema.optionalElement(Schema.Boolean)]) }).annotate({ identifier: "User", title: "A user" });
const schema = User;
"#);
}

// =============================================================================
// JSON Schema
// =============================================================================

#[test]
fn test_snapshot_user_json_schema() {
    let document = extract(&user()).unwrap();
    let schema = to_json_schema(&document, &JsonSchemaConfig::default()).unwrap();
    let pretty = serde_json::to_string_pretty(&schema.to_value()).unwrap();
    insta::assert_snapshot!(pretty, @r##"
{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$ref": "#/$defs/User",
  "$defs": {
    "User": {
      "type": "object",
      "properties": {
        "id": {
          "$ref": "#/$defs/UserId"
        },
        "age": {
          "type": "number",
          "allOf": [
            {
              "type": "integer",
              "title": "isInt"
            }
          ],
          "minimum": 0,
          "maximum": 150,
          "title": "isBetween(0, 150)"
        },
        "role": {
          "oneOf": [
            {
              "type": "string",
              "const": "admin"
            },
            {
              "type": "string",
              "const": "user"
            }
          ]
        },
        "pair": {
          "type": "array",
          "prefixItems": [
            {
              "$ref": "#/$defs/UserId"
            },
            {
              "type": "boolean"
            }
          ],
          "items": false,
          "minItems": 1
        }
      },
      "required": [
        "id",
        "role",
        "pair"
      ],
      "additionalProperties": false,
      "title": "A user"
    },
    "UserId": {
      "type": "string",
      "minLength": 1,
      "title": "isMinLength(1)"
    }
  }
}
"##);
}

// =============================================================================
// Plain JSON
// =============================================================================

#[test]
fn test_snapshot_plain_json() {
    let document = extract(&Ast::string().identified("ID")).unwrap();
    let pretty = serde_json::to_string_pretty(&to_json(&document).unwrap()).unwrap();
    insta::assert_snapshot!(pretty, @r#"
{
  "format": "draft-2020-12",
  "schema": {
    "_tag": "Reference",
    "target": "ID",
    "checks": [],
    "annotations": {}
  },
  "definitions": {
    "ID": {
      "_tag": "String",
      "checks": [],
      "annotations": {
        "identifier": "ID"
      }
    }
  }
}
"#);
}
