use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const ORDER_PROTO: &str = include_str!("../../samples/orders/order.proto");
const ORDER_H:     &str = include_str!("../../samples/orders/order.h");
const REPLY_PROTO: &str = include_str!("../../samples/reply/reply.proto");
const REPLY_H:     &str = include_str!("../../samples/reply/reply.h");

fn protoc_adapter(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_protoc-adapter"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run protoc-adapter")
}

fn write(dir: &Path, name: &str, text: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn report(output: &Output) -> serde_json::Value {
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout is not a JSON report")
}

#[test]
fn test_match_discovers_files_recursively() {
    let dir = tempdir().unwrap();
    write(dir.path(), "proto/order.proto", ORDER_PROTO);
    write(dir.path(), "include/deep/order.h", ORDER_H);

    let out = protoc_adapter(&["match", "--working-path", dir.path().to_str().unwrap()]);
    let value = report(&out);

    let matches = value["matches"].as_array().unwrap();
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0]["idl_entity"], "OrderInfo");
    assert_eq!(matches[0]["fields"][2]["struct_nested"], "OrderItem");
    assert_eq!(matches[0]["fields"][2]["is_repeated"], true);
}

#[test]
fn test_match_applies_envelope_convention_by_default() {
    let dir = tempdir().unwrap();
    write(dir.path(), "reply.proto", REPLY_PROTO);
    write(dir.path(), "reply.h", REPLY_H);

    let value = report(&protoc_adapter(&["match", "-w", dir.path().to_str().unwrap()]));
    let rep = value["matches"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["idl_entity"] == "RepQueryBalance")
        .unwrap();
    assert_eq!(rep["fields"][0]["is_reply_header_mapping"], true);
    assert_eq!(rep["fields"][0]["struct_type"], "WebServiceReplyHeader");
}

#[test]
fn test_match_with_envelope_config_and_output_file() {
    let dir = tempdir().unwrap();
    write(dir.path(), "in/reply.proto", REPLY_PROTO);
    write(dir.path(), "in/reply.hpp", REPLY_H);
    write(dir.path(), "envelope.json", r#"{ "reply_header_type": "ReplyDto" }"#);
    let report_path = dir.path().join("report.json");

    let out = protoc_adapter(&[
        "match",
        "--working-path",
        dir.path().join("in").to_str().unwrap(),
        "--envelope-config",
        dir.path().join("envelope.json").to_str().unwrap(),
        "--output",
        report_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    let last = value["matches"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["idl_entity"], "msgHeader");
    assert_eq!(last["struct_entity"], "ReplyDto");
    assert_eq!(last["struct_source"], "<synthetic>");
}

#[test]
fn test_no_envelope_reports_unmatched_field() {
    let dir = tempdir().unwrap();
    write(dir.path(), "reply.proto", REPLY_PROTO);
    write(dir.path(), "reply.h", REPLY_H);

    let out = protoc_adapter(&["match", "-w", dir.path().to_str().unwrap(), "--no-envelope"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("UnmatchedField"), "stderr: {}", stderr);
    assert!(stderr.contains("trace_id"), "stderr: {}", stderr);
}

#[test]
fn test_missing_headers_is_an_error() {
    let dir = tempdir().unwrap();
    write(dir.path(), "order.proto", ORDER_PROTO);

    let out = protoc_adapter(&["match", "-w", dir.path().to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("MissingInput"));
}

#[test]
fn test_entities_command() {
    let dir = tempdir().unwrap();
    write(dir.path(), "order.h", ORDER_H);

    let out = protoc_adapter(&["entities", "--input", dir.path().join("order.h").to_str().unwrap()]);
    let value = report(&out);
    let entities = value.as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[1]["original_name"], "OrderInfo");
    assert_eq!(entities[1]["fields"][1]["type_name"], "char");
}

#[test]
fn test_entities_rejects_unknown_extension() {
    let dir = tempdir().unwrap();
    write(dir.path(), "order.txt", ORDER_PROTO);

    let out = protoc_adapter(&["entities", "-i", dir.path().join("order.txt").to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unrecognized schema file extension"));
}
