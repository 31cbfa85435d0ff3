use script_js::parse;
use serde_json::json;
use serde_json::Value;

fn to_json(source: &str) -> Value {
  serde_json::to_value(parse(source).unwrap()).unwrap()
}

#[test]
fn serializes_only_syntax_with_type_tags() {
  let value = to_json("let x = 1;");
  assert_eq!(
    value,
    json!({
      "body": [{
        "$t": "VarDecl",
        "mode": "Let",
        "declarators": [{
          "name": "x",
          "initializer": { "$t": "LitNum", "value": 1.0 },
        }],
      }],
      "strict": false,
    })
  );
}

#[test]
fn serializes_nested_expressions() {
  let value = to_json("'use strict'; f(a.b);");
  assert_eq!(value["strict"], json!(true));
  let call = &value["body"][1]["expr"];
  assert_eq!(call["$t"], json!("Call"));
  assert_eq!(call["callee"], json!({ "$t": "Id", "name": "f" }));
  assert_eq!(
    call["arguments"][0],
    json!({ "$t": "Member", "left": { "$t": "Id", "name": "a" }, "right": "b" })
  );
}

#[test]
fn serializes_function_bodies() {
  let value = to_json("const f = x => x;");
  let func = &value["body"][0]["declarators"][0]["initializer"]["func"];
  assert_eq!(func["arrow"], json!(true));
  assert_eq!(func["parameters"], json!(["x"]));
  assert_eq!(func["body"], json!({ "Expression": { "$t": "Id", "name": "x" } }));
}
