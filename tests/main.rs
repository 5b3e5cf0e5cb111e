use std::collections::BTreeMap;
use std::rc::Rc;

use argfields::*;
use assert_matches::assert_matches;
use rstest::rstest;

fn register(wrapper: &DataclassWrapper) -> ArgumentParser {
    let mut parser = ArgumentParser::new("program");
    wrapper.register(&mut parser).unwrap();
    parser
}

fn complete(outcome: ParseOutcome) -> ConstructorArguments {
    match outcome {
        ParseOutcome::Complete(arguments) => arguments,
        other => panic!("unexpected outcome {other:?}"),
    }
}

fn color() -> TypeDescriptor {
    TypeDescriptor::enumeration(
        EnumType::new("Color")
            .member("RED", Value::Int(1))
            .member("GREEN", Value::Int(2))
            .member("BLUE", Value::Int(3)),
    )
}

#[test]
fn reused_count() {
    // Setup
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("count", TypeDescriptor::Int)));
    let wrapper = DataclassWrapper::builder(schema)
        .destination("A")
        .destination("B")
        .build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(parser.parse_tokens(&["--count", "1", "2"]).unwrap());

    // Verify
    assert_eq!(
        wrapper.field("count").unwrap().results(),
        BTreeMap::from([
            ("A.count".to_string(), Value::Int(1)),
            ("B.count".to_string(), Value::Int(2)),
        ])
    );
    assert_eq!(arguments.get("A", "count"), Some(&Value::Int(1)));
    assert_eq!(arguments.get("B", "count"), Some(&Value::Int(2)));
    assert_eq!(arguments.instance("A").unwrap().type_name, "Config");
}

#[test]
fn reused_count_replicated() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("count", TypeDescriptor::Int)));
    let wrapper = DataclassWrapper::builder(schema)
        .destination("a")
        .destination("b")
        .destination("c")
        .build();
    let parser = register(&wrapper);

    let arguments = complete(parser.parse_tokens(&["--count", "5"]).unwrap());

    for destination in ["a", "b", "c"] {
        assert_eq!(arguments.get(destination, "count"), Some(&Value::Int(5)));
    }
}

#[test]
fn reused_count_inconsistent() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("count", TypeDescriptor::Int)));
    let wrapper = DataclassWrapper::builder(schema)
        .destination("a")
        .destination("b")
        .destination("c")
        .build();
    let parser = register(&wrapper);

    assert_eq!(
        parser.parse_tokens(&["--count", "1", "2"]).unwrap_err(),
        ParseError::Field(FieldError::InconsistentArgument {
            field: "count".to_string(),
            received: 2,
            expected: 3,
        })
    );
}

#[rstest]
#[case(vec!["--values", "1", "2"], vec![1], vec![2])]
#[case(vec!["--values", "3"], vec![3], vec![3])]
#[case(vec!["--values", "[1,2]", "[3]"], vec![1, 2], vec![3])]
#[case(vec!["--values", "[4, 5]"], vec![4, 5], vec![4, 5])]
#[case(vec!["--values", "[]", "6"], vec![], vec![6])]
fn reused_list(#[case] tokens: Vec<&str>, #[case] a: Vec<i64>, #[case] b: Vec<i64>) {
    // Setup
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("values", TypeDescriptor::list(TypeDescriptor::Int))),
    );
    let wrapper = DataclassWrapper::builder(schema)
        .destination("a")
        .destination("b")
        .build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(parser.parse_tokens(&tokens[..]).unwrap());

    // Verify
    let ints = |values: Vec<i64>| Value::List(values.into_iter().map(Value::Int).collect());
    assert_eq!(arguments.get("a", "values"), Some(&ints(a)));
    assert_eq!(arguments.get("b", "values"), Some(&ints(b)));
}

#[test]
fn reused_tuple() {
    // Setup
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new(
        "pair",
        TypeDescriptor::tuple(vec![TypeDescriptor::Str, TypeDescriptor::Int]),
    )));
    let wrapper = DataclassWrapper::builder(schema)
        .destination("a")
        .destination("b")
        .build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(parser.parse_tokens(&["--pair", "(x,1)", "(y,2)"]).unwrap());
    let shared = complete(parser.parse_tokens(&["--pair", "(z,3)"]).unwrap());

    // Verify
    assert_eq!(
        arguments.get("a", "pair"),
        Some(&Value::Tuple(vec![Value::str("x"), Value::Int(1)]))
    );
    assert_eq!(
        arguments.get("b", "pair"),
        Some(&Value::Tuple(vec![Value::str("y"), Value::Int(2)]))
    );
    for destination in ["a", "b"] {
        assert_eq!(
            shared.get(destination, "pair"),
            Some(&Value::Tuple(vec![Value::str("z"), Value::Int(3)]))
        );
    }
    assert_matches!(
        parser.parse_tokens(&["--pair", "(x,one)"]).unwrap_err(),
        ParseError::InvalidValue { option, .. } => assert_eq!(option, "--pair")
    );
}

#[rstest]
#[case(vec![], "BLUE", "RED")]
#[case(vec!["--color", "GREEN"], "GREEN", "GREEN")]
#[case(vec!["--color", "GREEN", "BLUE"], "GREEN", "BLUE")]
fn reused_enumeration(#[case] tokens: Vec<&str>, #[case] a: &str, #[case] b: &str) {
    // Setup
    let enum_type = match color() {
        TypeDescriptor::Enum(enum_type) => enum_type,
        _ => unreachable!(),
    };
    let member = |name: &str| Value::Enum(enum_type.lookup(name).unwrap());
    let schema = Rc::new(
        StructSchema::new("Config").field(FieldSpec::new("color", color()).default_value(member("RED"))),
    );
    let wrapper = DataclassWrapper::builder(schema)
        .destination("a")
        .destination("b")
        .default_instance(Instance::new("Config").with("color", member("BLUE")))
        .default_instance(Instance::new("Config"))
        .build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(parser.parse_tokens(&tokens[..]).unwrap());

    // Verify
    assert_eq!(arguments.get("a", "color"), Some(&member(a)));
    assert_eq!(arguments.get("b", "color"), Some(&member(b)));
    assert_eq!(
        wrapper.field("color").unwrap().arg_options().default,
        Some(FieldDefault::PerInstance(vec![
            Some(Value::str("BLUE")),
            Some(Value::str("RED")),
        ]))
    );
}

#[rstest]
#[case(vec!["--verbose"], true)]
#[case(vec![], false)]
#[case(vec!["--verbose", "false"], false)]
#[case(vec!["--verbose", "YES"], true)]
#[case(vec!["--verbose=0"], false)]
fn verbose(#[case] tokens: Vec<&str>, #[case] expected: bool) {
    // Setup
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("verbose", TypeDescriptor::Bool).default_value(Value::Bool(false))),
    );
    let wrapper = DataclassWrapper::builder(schema).build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(parser.parse_tokens(&tokens[..]).unwrap());

    // Verify
    assert_eq!(arguments.get("config", "verbose"), Some(&Value::Bool(expected)));
}

#[test]
fn verbose_invalid() {
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("verbose", TypeDescriptor::Bool).default_value(Value::Bool(false))),
    );
    let parser = register(&DataclassWrapper::builder(schema).build());

    assert_matches!(
        parser.parse_tokens(&["--verbose", "maybe"]).unwrap_err(),
        ParseError::InvalidValue { option, source: ConversionError::InvalidValue { token, .. } } => {
            assert_eq!(option, "--verbose");
            assert_eq!(token, "maybe");
        }
    );
}

#[test]
fn list_values() {
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("values", TypeDescriptor::list(TypeDescriptor::Int))),
    );
    let parser = register(&DataclassWrapper::builder(schema).build());

    let arguments = complete(parser.parse_tokens(&["--values", "1", "2", "3"]).unwrap());

    assert_eq!(
        arguments.get("config", "values"),
        Some(&Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
    );
}

#[test]
fn tuple_pair() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new(
        "pair",
        TypeDescriptor::tuple(vec![TypeDescriptor::Str, TypeDescriptor::Str]),
    )));
    let parser = register(&DataclassWrapper::builder(schema).build());

    let arguments = complete(parser.parse_tokens(&["--pair", "a", "b"]).unwrap());

    assert_eq!(
        arguments.get("config", "pair"),
        Some(&Value::Tuple(vec![Value::str("a"), Value::str("b")]))
    );
    assert_matches!(
        parser.parse_tokens(&["--pair", "a"]).unwrap_err(),
        ParseError::TooFewValues { provided: 1, expected: 2, .. }
    );
}

#[test]
fn heterogeneous_tuple() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new(
        "entry",
        TypeDescriptor::tuple(vec![TypeDescriptor::Str, TypeDescriptor::Int]),
    )));
    let parser = register(&DataclassWrapper::builder(schema).build());

    let arguments = complete(parser.parse_tokens(&["--entry", "a", "2"]).unwrap());

    assert_eq!(
        arguments.get("config", "entry"),
        Some(&Value::Tuple(vec![Value::str("a"), Value::Int(2)]))
    );
}

#[rstest]
#[case(vec![], "RED")]
#[case(vec!["--color", "BLUE"], "BLUE")]
fn enumeration(#[case] tokens: Vec<&str>, #[case] expected: &str) {
    // Setup
    let enum_type = match color() {
        TypeDescriptor::Enum(enum_type) => enum_type,
        _ => unreachable!(),
    };
    let red = enum_type.lookup("RED").unwrap();
    let schema = Rc::new(
        StructSchema::new("Config").field(FieldSpec::new("color", color()).default_value(Value::Enum(red))),
    );
    let parser = register(&DataclassWrapper::builder(schema).build());

    // Execute
    let arguments = complete(parser.parse_tokens(&tokens[..]).unwrap());

    // Verify
    assert_eq!(
        arguments.get("config", "color"),
        Some(&Value::Enum(enum_type.lookup(expected).unwrap()))
    );
}

#[test]
fn enumeration_invalid_choice() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("color", color())));
    let parser = register(&DataclassWrapper::builder(schema).build());

    assert_eq!(
        parser.parse_tokens(&["--color", "PURPLE"]).unwrap_err(),
        ParseError::InvalidChoice {
            option: "--color".to_string(),
            value: "PURPLE".to_string(),
            choices: "RED, GREEN, BLUE".to_string(),
        }
    );
}

#[test]
fn missing_required() {
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("count", TypeDescriptor::Int)));
    let parser = register(&DataclassWrapper::builder(schema).build());

    assert_eq!(
        parser.parse_tokens(&[]).unwrap_err(),
        ParseError::MissingRequired("--count".to_string())
    );
}

#[test]
fn nested_prefix_and_alias() {
    // Setup
    let optim = Rc::new(
        StructSchema::new("Optim")
            .field(FieldSpec::new("lr", TypeDescriptor::Float).default_value(Value::Float(0.1))),
    );
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(
                FieldSpec::new("batch_size", TypeDescriptor::Int)
                    .default_value(Value::Int(8))
                    .alias("-b"),
            )
            .field(FieldSpec::new("optim", TypeDescriptor::nested(optim))),
    );
    let wrapper = DataclassWrapper::builder(schema)
        .prefix("train.")
        .config(FieldConfig::default().with_dash_variants(true))
        .build();
    let parser = register(&wrapper);

    // Execute
    let arguments = complete(
        parser
            .parse_tokens(&["--train.batch-size", "16", "--train.lr", "0.5"])
            .unwrap(),
    );

    // Verify
    assert_eq!(
        wrapper.field("batch_size").unwrap().option_strings(),
        &[
            "-train.b".to_string(),
            "--train.batch-size".to_string(),
            "--train.batch_size".to_string(),
        ]
    );
    assert_eq!(arguments.get("config", "batch_size"), Some(&Value::Int(16)));
    assert_eq!(arguments.get("config.optim", "lr"), Some(&Value::Float(0.5)));
    let instance = arguments.instance("config").unwrap();
    assert_matches!(instance.get("optim"), Some(Value::Struct(optim)) => {
        assert_eq!(optim.type_name, "Optim");
        assert_eq!(optim.get("lr"), Some(&Value::Float(0.5)));
    });
}

#[rstest]
#[case(vec![], true)]
#[case(vec!["--cache"], false)]
#[case(vec!["--cache", "true"], true)]
#[case(vec!["--no_cache"], false)]
fn proxy(#[case] tokens: Vec<&str>, #[case] expected: bool) {
    // Setup
    let cache = FieldSpec::new("cache", TypeDescriptor::Bool)
        .default_value(Value::Bool(true))
        .original_default(Value::Bool(true));
    let no_cache = FieldSpec::new("no_cache", TypeDescriptor::Bool)
        .proxy_for(&cache)
        .options(ArgOptions::default().with_required(false));
    let schema = Rc::new(StructSchema::new("Config").field(cache).field(no_cache));
    let parser = register(&DataclassWrapper::builder(schema).build());

    // Execute
    let arguments = complete(parser.parse_tokens(&tokens[..]).unwrap());

    // Verify
    assert_eq!(arguments.get("config", "cache"), Some(&Value::Bool(expected)));
    assert_eq!(arguments.get("config", "no_cache"), None);
}

#[test]
fn subcommands() {
    // Setup
    let train = Rc::new(
        StructSchema::new("Train")
            .field(FieldSpec::new("epochs", TypeDescriptor::Int).default_value(Value::Int(10))),
    );
    let test = Rc::new(
        StructSchema::new("Test")
            .field(FieldSpec::new("split", TypeDescriptor::Str).default_value(Value::str("dev"))),
    );
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("seed", TypeDescriptor::Int).default_value(Value::Int(0)))
            .field(FieldSpec::new(
                "command",
                TypeDescriptor::Union(vec![TypeDescriptor::nested(train), TypeDescriptor::nested(test)]),
            )),
    );
    let parser = register(&DataclassWrapper::builder(schema).build());

    // Execute
    let arguments = complete(
        parser
            .parse_tokens(&["--seed", "3", "train", "--epochs", "2"])
            .unwrap(),
    );

    // Verify
    let instance = arguments.instance("config").unwrap();
    assert_eq!(instance.get("seed"), Some(&Value::Int(3)));
    assert_matches!(instance.get("command"), Some(Value::Struct(command)) => {
        assert_eq!(command.type_name, "Train");
        assert_eq!(command.get("epochs"), Some(&Value::Int(2)));
    });

    let arguments = complete(parser.parse_tokens(&["test"]).unwrap());
    assert_matches!(arguments.value_at("config.command"), Some(Value::Struct(command)) => {
        assert_eq!(command.type_name, "Test");
        assert_eq!(command.get("split"), Some(&Value::str("dev")));
    });

    assert_matches!(
        parser.parse_tokens(&["--seed", "3"]).unwrap_err(),
        ParseError::MissingSubcommand(_)
    );
}

#[test]
fn help() {
    // Setup
    let schema = Rc::new(
        StructSchema::new("Config")
            .field(FieldSpec::new("count", TypeDescriptor::Int).default_value(Value::Int(1)))
            .field(FieldSpec::new("color", color()))
            .doc("count", AttributeDocString::below("How many times to run."))
            .doc("color", AttributeDocString::inline("The colour to paint.")),
    );
    let parser = register(&DataclassWrapper::builder(schema).build());

    // Execute
    let outcome = parser.parse_tokens(&["--help"]).unwrap();

    // Verify
    assert_matches!(outcome, ParseOutcome::Help(message) => {
        assert!(message.starts_with("usage: program [-h]"), "{message}");
        assert!(message.contains("[--count COUNT]"), "{message}");
        assert!(message.contains("--color {RED,GREEN,BLUE}"), "{message}");
        assert!(message.contains("How many times to run. (default: 1)"), "{message}");
        assert!(message.contains("The colour to paint."), "{message}");
    });
}

#[test]
fn strict_construction() {
    // Setup
    let path = TypeDescriptor::custom(CustomType::new("Path", |value| match value {
        Value::Str(s) if s.starts_with('/') => Ok(Value::str(s.clone())),
        other => Err(format!("'{other}' is not absolute")),
    }));
    let schema = Rc::new(StructSchema::new("Config").field(FieldSpec::new("path", path)));
    let lenient = register(&DataclassWrapper::builder(schema.clone()).build());
    let strict = register(
        &DataclassWrapper::builder(schema)
            .config(FieldConfig::default().with_construction(ConstructionPolicy::Strict))
            .build(),
    );

    // Execute & Verify
    let arguments = complete(lenient.parse_tokens(&["--path", "tmp"]).unwrap());
    assert_eq!(arguments.get("config", "path"), Some(&Value::str("tmp")));

    assert_matches!(
        strict.parse_tokens(&["--path", "tmp"]).unwrap_err(),
        ParseError::Field(FieldError::Construction { field, type_name, .. }) => {
            assert_eq!(field, "path");
            assert_eq!(type_name, "Path");
        }
    );
}
