//! Reconciler Tests
//!
//! End-to-end merges of one implementation file against one scaffold.

use pretty_assertions::assert_eq;
use svcsync_merge::{FileOutcome, Reconciler};
use svcsync_source::{LayoutFormatter, MarkerPattern, SourceFile};
use svcsync_test_utils::{GoFile, GoMethod, GoType};

fn reconciler() -> Reconciler {
    Reconciler::new(MarkerPattern::default(), Box::new(LayoutFormatter))
}

struct Scratch {
    _dir: tempfile::TempDir,
    path: std::path::PathBuf,
}

impl Scratch {
    fn with(code: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("greeter.go");
        std::fs::write(&path, code).unwrap();
        Self { _dir: dir, path }
    }

    fn read(&self) -> String {
        std::fs::read_to_string(&self.path).unwrap()
    }

    fn sync(&self, scaffold: &GoFile) -> FileOutcome {
        let new = SourceFile::parse("staging/greeter.go", scaffold.render()).unwrap();
        reconciler().reconcile(&self.path, &new).unwrap()
    }
}

#[test]
fn missing_method_is_appended() {
    let body = "return &pb.SayHelloReply{Message: \"hi \" + req.Name}, nil";
    let old = GoFile::new().with_type(
        GoType::service("GreeterService", "Greeter").method(GoMethod::new("SayHello").body(body)),
    );
    let scratch = Scratch::with(&old.render());

    let scaffold = GoFile::service("GreeterService", "Greeter", &["SayHello", "SayGoodbye"]);
    let outcome = scratch.sync(&scaffold);

    let expected = GoFile::new().with_type(
        GoType::service("GreeterService", "Greeter")
            .method(GoMethod::new("SayHello").body(body))
            .method("SayGoodbye"),
    );
    assert_eq!(scratch.read(), expected.render());
    assert_eq!(outcome.added, vec!["GreeterService.SayGoodbye".to_string()]);
    assert_eq!(outcome.writes, 1);

    let again = scratch.sync(&scaffold);
    assert!(again.is_unchanged());
    assert_eq!(scratch.read(), expected.render());
}

#[test]
fn dropped_method_is_demoted_in_place() {
    let old = GoFile::service("GreeterService", "Greeter", &["SayHello", "SayGoodbye"]).render();
    let scratch = Scratch::with(&old);

    let outcome = scratch.sync(&GoFile::service("GreeterService", "Greeter", &["SayHello"]));

    let after = scratch.read();
    assert_eq!(after, old.replacen(") SayGoodbye(", ") sayGoodbye(", 1));
    assert_eq!(after.len(), old.len());
    assert!(after.contains("*pb.SayGoodbyeRequest"));
    assert_eq!(outcome.demoted, vec!["SayGoodbye".to_string()]);
    assert!(outcome.added.is_empty());

    assert!(scratch.sync(&GoFile::service("GreeterService", "Greeter", &["SayHello"])).is_unchanged());
}

#[test]
fn demotion_is_not_reverted_when_method_returns() {
    let old = GoFile::service("GreeterService", "Greeter", &["SayHello", "SayGoodbye"]).render();
    let scratch = Scratch::with(&old);
    scratch.sync(&GoFile::service("GreeterService", "Greeter", &["SayHello"]));

    let outcome = scratch.sync(&GoFile::service(
        "GreeterService",
        "Greeter",
        &["SayHello", "SayGoodbye"],
    ));

    let after = scratch.read();
    assert!(after.contains(") sayGoodbye("));
    assert!(after.contains(") SayGoodbye("));
    assert_eq!(outcome.added, vec!["GreeterService.SayGoodbye".to_string()]);
    assert!(outcome.demoted.is_empty());
}

#[test]
fn blocks_move_with_trailing_code() {
    let method = |name: &str| GoMethod::new(name).trailing(format!("// after {name}"));
    let file = |order: &[&str]| {
        let mut ty = GoType::service("GreeterService", "Greeter");
        for name in order {
            ty = ty.method(method(name));
        }
        GoFile::new().with_type(ty)
    };

    let scratch = Scratch::with(&file(&["C", "A", "B"]).render());
    let outcome = scratch.sync(&GoFile::service("GreeterService", "Greeter", &["A", "B", "C"]));

    assert_eq!(scratch.read(), file(&["A", "B", "C"]).render());
    assert_eq!(outcome.reordered, vec!["GreeterService".to_string()]);
    assert!(outcome.added.is_empty());
    assert!(outcome.demoted.is_empty());
}

#[test]
fn marker_match_survives_rename() {
    let old = GoFile::service("Foo", "Bar", &["Hello"]);
    let scratch = Scratch::with(&old.render());

    let outcome = scratch.sync(&GoFile::service("BarService", "Bar", &["Hello", "Extra"]));

    let after = scratch.read();
    assert_eq!(after, GoFile::service("Foo", "Bar", &["Hello", "Extra"]).render());
    assert!(after.contains("func (s *Foo) Extra(ctx context.Context"));
    assert!(!after.contains("type BarService"));
    assert_eq!(outcome.added, vec!["Foo.Extra".to_string()]);
}

#[test]
fn unmatched_scaffold_type_is_added_whole() {
    let scratch = Scratch::with(&GoFile::service("GreeterService", "Greeter", &["SayHello"]).render());
    let scaffold = GoFile::new()
        .with_type(GoType::service("GreeterService", "Greeter").methods(&["SayHello"]))
        .with_type(GoType::service("EchoService", "Echo").methods(&["Echo"]));

    let outcome = scratch.sync(&scaffold);

    let after = scratch.read();
    assert!(after.contains("type EchoService struct {\n\tpb.UnimplementedEchoServer\n}"));
    assert!(after.contains("func (s *EchoService) Echo(ctx context.Context"));
    assert_eq!(outcome.added, vec!["EchoService.Echo".to_string()]);
    assert!(scratch.sync(&scaffold).is_unchanged());
}

#[test]
fn other_contract_in_same_file_is_untouched() {
    let old = GoFile::new()
        .with_type(GoType::service("GreeterService", "Greeter").methods(&["SayHello"]))
        .with_type(GoType::service("AdminService", "Admin").methods(&["Reset"]))
        .render();
    let scratch = Scratch::with(&old);

    let outcome = scratch.sync(&GoFile::service("GreeterService", "Greeter", &["SayHello"]));

    assert!(outcome.is_unchanged());
    assert_eq!(scratch.read(), old);
}

#[test]
fn full_merge_is_idempotent() {
    let old = GoFile::new()
        .with_type(
            GoType::service("GreeterService", "Greeter")
                .method(GoMethod::new("C").doc("C is third."))
                .method(GoMethod::new("A").trailing("var cache = map[string]string{}"))
                .method("Legacy")
                .method("B"),
        )
        .render();
    let scratch = Scratch::with(&old);
    let scaffold = GoFile::service("GreeterService", "Greeter", &["A", "B", "C", "D"]);

    let first = scratch.sync(&scaffold);
    assert_eq!(first.added, vec!["GreeterService.D".to_string()]);
    assert_eq!(first.demoted, vec!["Legacy".to_string()]);
    assert_eq!(first.reordered, vec!["GreeterService".to_string()]);

    let after_first = scratch.read();
    let file = SourceFile::parse("greeter.go", after_first.clone()).unwrap();
    let order: Vec<_> = file
        .type_decl("GreeterService")
        .unwrap()
        .procedures()
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(order, vec!["A", "legacy", "B", "C", "D"]);
    assert!(after_first.contains("// C is third.\nfunc (s *GreeterService) C("));

    let second = scratch.sync(&scaffold);
    assert!(second.is_unchanged());
    assert_eq!(scratch.read(), after_first);
}

#[test]
fn raw_string_contents_survive_merge() {
    let banner = "var banner = `Hello   \n\n\n\n  indented  \n`";
    let old = GoFile::new().with_type(
        GoType::service("GreeterService", "Greeter").method(GoMethod::new("A").trailing(banner)),
    );
    let scratch = Scratch::with(&old.render());

    let scaffold = GoFile::service("GreeterService", "Greeter", &["A", "B"]);
    let outcome = scratch.sync(&scaffold);

    let after = scratch.read();
    assert!(after.contains(banner));
    let expected = GoFile::new().with_type(
        GoType::service("GreeterService", "Greeter")
            .method(GoMethod::new("A").trailing(banner))
            .method("B"),
    );
    assert_eq!(after, expected.render());
    assert_eq!(outcome.added, vec!["GreeterService.B".to_string()]);

    assert!(scratch.sync(&scaffold).is_unchanged());
    assert_eq!(scratch.read(), after);
}

#[test]
fn every_marked_type_is_sorted() {
    let old = GoFile::new()
        .with_type(GoType::service("S", "Alpha").methods(&["B", "A"]))
        .with_type(GoType::service("T", "Beta").methods(&["Y", "X"]));
    let scratch = Scratch::with(&old.render());
    let scaffold = GoFile::new()
        .with_type(GoType::service("S", "Alpha").methods(&["A", "B"]))
        .with_type(GoType::service("T", "Beta").methods(&["X", "Y"]));

    let outcome = scratch.sync(&scaffold);

    assert_eq!(outcome.reordered, vec!["S".to_string(), "T".to_string()]);
    assert!(outcome.added.is_empty());
    assert!(outcome.demoted.is_empty());

    let after = scratch.read();
    let position = |header: &str| after.find(header).unwrap_or_else(|| panic!("{header} missing"));
    let headers = [
        position("func (s *S) A("),
        position("func (s *T) X("),
        position("func (s *S) B("),
        position("func (s *T) Y("),
    ];
    assert!(headers.windows(2).all(|pair| pair[0] < pair[1]), "order: {headers:?}");

    let file = SourceFile::parse("greeter.go", after.clone()).unwrap();
    for (name, order) in [("S", ["A", "B"]), ("T", ["X", "Y"])] {
        let found: Vec<_> = file.type_decl(name).unwrap().procedures().map(|p| p.name().to_string()).collect();
        assert_eq!(found, order);
    }

    assert!(scratch.sync(&scaffold).is_unchanged());
    assert_eq!(scratch.read(), after);
}
