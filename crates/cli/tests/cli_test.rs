use predicates::prelude::*;
use prost::Message;
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::source_code_info::Location;
use prost_types::{
    field_descriptor_proto, DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, SourceCodeInfo,
};
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd =
        assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_protoc-gen-pydocstring")));
    cmd.env_remove("PROTOC_DOCS_PANDOC");
    cmd
}

fn location(path: &[i32], leading: &str) -> Location {
    Location {
        path: path.to_vec(),
        leading_comments: Some(leading.to_string()),
        ..Default::default()
    }
}

fn foo_file(summary: &str) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("pkg/foo.proto".to_string()),
        package: Some("pkg".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Foo".to_string()),
            field: vec![FieldDescriptorProto {
                name: Some("bar".to_string()),
                number: Some(1),
                label: Some(field_descriptor_proto::Label::Optional as i32),
                r#type: Some(field_descriptor_proto::Type::String as i32),
                ..Default::default()
            }],
            ..Default::default()
        }],
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                location(&[4, 0], summary),
                location(&[4, 0, 2, 0], " The bar field.\n"),
            ],
        }),
        ..Default::default()
    }
}

fn request(summary: &str, parameter: Option<&str>) -> Vec<u8> {
    CodeGeneratorRequest {
        file_to_generate: vec!["pkg/foo.proto".to_string()],
        parameter: parameter.map(str::to_string),
        proto_file: vec![foo_file(summary)],
        ..Default::default()
    }
    .encode_to_vec()
}

fn run_plugin(cmd: &mut assert_cmd::Command, input: Vec<u8>) -> CodeGeneratorResponse {
    let output = cmd.write_stdin(input).assert().success().get_output().clone();
    CodeGeneratorResponse::decode(output.stdout.as_slice()).unwrap()
}

#[test]
fn cli_plugin_plain_comments() {
    let response = run_plugin(&mut cmd(), request(" Make a Foo.\n", None));

    assert!(response.error.is_none());
    assert_eq!(response.file.len(), 1);
    assert_eq!(response.file[0].name(), "pkg/foo_pb2.py");
    assert_eq!(response.file[0].insertion_point(), "class_scope:pkg.Foo");

    let content = response.file[0].content();
    assert!(content.contains("Make a Foo."), "Got: {content}");
    assert!(content.contains("Attributes:"), "Got: {content}");
    assert!(content.contains("bar:"), "Got: {content}");
    assert!(content.contains("The bar field."), "Got: {content}");
}

#[test]
fn cli_plugin_applies_parameter() {
    let response = run_plugin(
        &mut cmd(),
        request(" Make a Foo.\n", Some("module_suffix=_pb2.pyi")),
    );
    assert_eq!(response.file[0].name(), "pkg/foo_pb2.pyi");
}

#[test]
fn cli_plugin_reports_bad_parameter_in_response() {
    let response = run_plugin(&mut cmd(), request(" Make a Foo.\n", Some("colour=blue")));
    assert!(response.file.is_empty());
    assert!(response.error().contains("colour"), "Got: {}", response.error());
}

#[test]
fn cli_plugin_reports_missing_converter_in_response() {
    let response = run_plugin(
        cmd().args(["--pandoc", "/nonexistent/pandoc"]),
        request(" Make a *Foo*.\n", None),
    );
    assert!(response.file.is_empty());
    assert!(response.error().contains("spawn"), "Got: {}", response.error());
}

#[test]
fn cli_plugin_rejects_garbage_input() {
    cmd()
        .write_stdin(vec![0xff, 0xff, 0xff])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CodeGeneratorRequest"));
}

#[test]
fn cli_inspect() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("request.bin");
    std::fs::write(&path, request(" Make a *Foo*.\n", None)).unwrap();

    cmd()
        .args(["inspect", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"file\": \"pkg/foo.proto\""))
        .stdout(predicate::str::contains("\"qualified_name\": \"pkg.Foo\""))
        .stdout(predicate::str::contains("Make a *Foo*."));
}

#[test]
fn cli_convert_descriptors_plain_comments() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.pb");
    let output = temp.path().join("out.pb");
    let set = FileDescriptorSet {
        file: vec![foo_file(" Make a Foo.\n")],
    };
    std::fs::write(&input, set.encode_to_vec()).unwrap();

    cmd()
        .args(["convert-descriptors"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 2 comments"));

    let converted = FileDescriptorSet::decode(std::fs::read(&output).unwrap().as_slice()).unwrap();
    let locations = &converted.file[0].source_code_info.as_ref().unwrap().location;
    assert_eq!(locations[0].leading_comments.as_deref(), Some(" Make a Foo.\n"));
}

#[test]
fn cli_missing_config_file() {
    cmd()
        .args(["--config", "/nonexistent/config.yaml"])
        .write_stdin(request(" Make a Foo.\n", None))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}
