//! Testing utilities for svcsync workspace
//!
//! Go and proto fixture builders, a scratch project layout and a recording
//! scaffold generator.

#![allow(missing_docs)]

mod generator;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use walkdir::WalkDir;

pub use generator::{FixtureGenerator, GenerateCall};

pub const PROTO_IMPORT: &str = "demo/api/helloworld/v1";

/// One method of a fixture service type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMethod {
    pub name: String,
    pub doc: Option<String>,
    pub body: Option<String>,
    pub trailing: Option<String>,
}

impl GoMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            body: None,
            trailing: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Body lines, without the leading tab
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Free code placed after the method, separated by a blank line
    pub fn trailing(mut self, code: impl Into<String>) -> Self {
        self.trailing = Some(code.into());
        self
    }

    fn render(&self, receiver: &str) -> String {
        let mut out = String::new();
        if let Some(doc) = &self.doc {
            for line in doc.lines() {
                out.push_str("// ");
                out.push_str(line);
                out.push('\n');
            }
        }
        let name = &self.name;
        out.push_str(&format!(
            "func (s *{receiver}) {name}(ctx context.Context, req *pb.{name}Request) (*pb.{name}Reply, error) {{\n"
        ));
        let default_body = format!("return &pb.{name}Reply{{}}, nil");
        for line in self.body.as_deref().unwrap_or(&default_body).lines() {
            out.push('\t');
            out.push_str(line);
            out.push('\n');
        }
        out.push_str("}\n");
        if let Some(trailing) = &self.trailing {
            out.push('\n');
            out.push_str(trailing.trim_end());
            out.push('\n');
        }
        out
    }
}

impl From<&str> for GoMethod {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A fixture service struct
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoType {
    pub name: String,
    pub contract: Option<String>,
    pub methods: Vec<GoMethod>,
}

impl GoType {
    /// Unmarked struct
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract: None,
            methods: Vec::new(),
        }
    }

    /// Struct embedding `pb.Unimplemented<contract>Server`
    pub fn service(name: impl Into<String>, contract: impl Into<String>) -> Self {
        Self::new(name).contract(contract)
    }

    pub fn contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    pub fn method(mut self, method: impl Into<GoMethod>) -> Self {
        self.methods.push(method.into());
        self
    }

    pub fn methods(mut self, names: &[&str]) -> Self {
        self.methods.extend(names.iter().map(|n| GoMethod::new(*n)));
        self
    }

    fn render_decl(&self) -> String {
        let name = &self.name;
        match &self.contract {
            Some(contract) => format!(
                "type {name} struct {{\n\tpb.Unimplemented{contract}Server\n}}\n\nfunc New{name}() *{name} {{\n\treturn &{name}{{}}\n}}\n"
            ),
            None => format!("type {name} struct{{}}\n"),
        }
    }
}

/// A fixture Go service file in the shape the scaffold generator emits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFile {
    pub package: String,
    pub types: Vec<GoType>,
    pub trailer: Vec<String>,
}

impl GoFile {
    pub fn new() -> Self {
        Self {
            package: "service".to_string(),
            types: Vec::new(),
            trailer: Vec::new(),
        }
    }

    pub fn with_type(mut self, ty: GoType) -> Self {
        self.types.push(ty);
        self
    }

    pub fn with_trailer(mut self, code: impl Into<String>) -> Self {
        self.trailer.push(code.into());
        self
    }

    /// Single marked service type with default method bodies
    pub fn service(name: &str, contract: &str, methods: &[&str]) -> Self {
        Self::new().with_type(GoType::service(name, contract).methods(methods))
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "package {}\n\nimport (\n\t\"context\"\n\n\tpb \"{PROTO_IMPORT}\"\n)\n",
            self.package
        );
        for ty in &self.types {
            out.push('\n');
            out.push_str(&ty.render_decl());
        }
        for ty in &self.types {
            for method in &ty.methods {
                out.push('\n');
                out.push_str(&method.render(&ty.name));
            }
        }
        for code in &self.trailer {
            out.push('\n');
            out.push_str(code.trim_end());
            out.push('\n');
        }
        out
    }
}

impl Default for GoFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Proto definition declaring `contracts` with their rpc names
pub fn proto_file(package: &str, contracts: &[(&str, &[&str])]) -> String {
    let mut out = format!(
        "syntax = \"proto3\";\n\npackage {package};\n\noption go_package = \"{PROTO_IMPORT};v1\";\n"
    );
    for (contract, rpcs) in contracts {
        out.push_str(&format!("\nservice {contract} {{\n"));
        for rpc in *rpcs {
            out.push_str(&format!("  rpc {rpc} ({rpc}Request) returns ({rpc}Reply);\n"));
        }
        out.push_str("}\n");
    }
    out
}

/// Scratch Go project: `go.mod`, `api/` and `internal/service/`
#[derive(Debug)]
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module demo\n\ngo 1.22\n").unwrap();
        std::fs::create_dir_all(dir.path().join("api/helloworld/v1")).unwrap();
        std::fs::create_dir_all(dir.path().join("internal/service")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn api_dir(&self) -> PathBuf {
        self.root().join("api")
    }

    pub fn service_dir(&self) -> PathBuf {
        self.root().join("internal/service")
    }

    /// Write `api/helloworld/v1/<name>`
    pub fn write_proto(&self, name: &str, code: &str) -> PathBuf {
        let path = self.api_dir().join("helloworld/v1").join(name);
        std::fs::write(&path, code).unwrap();
        path
    }

    /// Write `internal/service/<name>`
    pub fn write_service(&self, name: &str, code: &str) -> PathBuf {
        let path = self.service_dir().join(name);
        std::fs::write(&path, code).unwrap();
        path
    }

    pub fn read_service(&self, name: &str) -> String {
        std::fs::read_to_string(self.service_dir().join(name)).unwrap()
    }

    /// Every file under the service directory, keyed by relative path
    pub fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        let base = self.service_dir();
        WalkDir::new(&base)
            .into_iter()
            .map(Result::unwrap)
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(&base).unwrap().to_path_buf();
                (rel, std::fs::read_to_string(e.path()).unwrap())
            })
            .collect()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_generator_shape() {
        let code = GoFile::service("GreeterService", "Greeter", &["SayHello"]).render();
        assert_eq!(
            code,
            concat!(
                "package service\n\nimport (\n\t\"context\"\n\n\tpb \"demo/api/helloworld/v1\"\n)\n\n",
                "type GreeterService struct {\n\tpb.UnimplementedGreeterServer\n}\n\n",
                "func NewGreeterService() *GreeterService {\n\treturn &GreeterService{}\n}\n\n",
                "func (s *GreeterService) SayHello(ctx context.Context, req *pb.SayHelloRequest) (*pb.SayHelloReply, error) {\n",
                "\treturn &pb.SayHelloReply{}, nil\n}\n",
            )
        );
    }

    #[test]
    fn proto_declares_services() {
        let proto = proto_file("helloworld.v1", &[("Greeter", &["SayHello"])]);
        assert!(proto.contains("service Greeter {\n  rpc SayHello (SayHelloRequest) returns (SayHelloReply);\n}"));
    }
}
