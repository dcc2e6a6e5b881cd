use affixlist_core::{ReplacementRule, ReplacementRuleSet, RuleError};

#[test]
fn lower_priority_applies_first() {
    let rules = ReplacementRuleSet::parse("#!priority 2\nA\nB\n#!priority 1\nB\nC\n")
        .expect("rule list");
    let order: Vec<&str> = rules.rules().iter().map(|rule| rule.find.as_str()).collect();
    assert_eq!(order, vec!["B", "A"]);
    assert_eq!(rules.apply("A"), "B");
}

#[test]
fn equal_priorities_keep_file_order() {
    let rules = ReplacementRuleSet::parse("A\nB\nB\nC\n").expect("rule list");
    assert_eq!(rules.apply("A"), "C");
}

#[test]
fn group_references_use_java_syntax() {
    let rules = ReplacementRuleSet::parse("# percent\n(\\d+)%\n$1 percent\n").expect("rule list");
    assert_eq!(rules.apply("50% more"), "50 percent more");
}

#[test]
fn escaped_dollar_is_literal() {
    let rules = ReplacementRuleSet::parse("<MIN>\n%1\\$.0f\n").expect("rule list");
    assert_eq!(rules.apply("Adds <MIN>"), "Adds %1$.0f");
}

#[test]
fn later_stages_build_on_earlier_ones() {
    let rules = ReplacementRuleSet::parse(
        "#!internal\n<ROUNDED>\n.0f\n#!stage 2\n#!external\n<MIN>\n%1\\$<ROUNDED>\n",
    )
    .expect("rule list");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.rules()[0].replace, "%1\\$.0f");
    assert_eq!(rules.apply("Deals <MIN>"), "Deals %1$.0f");
}

#[test]
fn single_stage_keeps_internal_rules() {
    let rules = ReplacementRuleSet::parse("#!internal\nA\nB\n").expect("rule list");
    assert_eq!(rules.len(), 1);
}

#[test]
fn name_directive_names_one_rule() {
    let rules =
        ReplacementRuleSet::parse("#!name percent\n%\npct\nX\nY\n").expect("rule list");
    assert_eq!(rules.rules()[0].name, "percent");
    assert_eq!(rules.rules()[1].name, "X");
}

#[test]
fn errors_are_collected_with_lines() {
    let err = ReplacementRuleSet::parse("#!priority high\nA\nB\nC\n").expect_err("bad list");
    assert_eq!(
        err.errors,
        vec![
            RuleError {
                line: 1,
                rule: 0,
                message: "invalid priority 'high'".to_string(),
                text: Some("#!priority high".to_string()),
            },
            RuleError {
                line: 4,
                rule: 2,
                message: "ran out of input looking for replacement body for raw name C"
                    .to_string(),
                text: None,
            },
        ]
    );
    let message = err.to_string();
    assert!(message.starts_with("Errors occurred parsing replacement rules:\n"));
    assert!(message.contains("line 4, rule 2: ran out of input"));
    assert!(message.contains("\tNo associated line"));
}

#[test]
fn lenient_parse_keeps_good_rules() {
    let (rules, errors) = ReplacementRuleSet::parse_lenient("(\nX\nA\nB\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 1);
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.apply("A"), "B");
}

#[test]
fn rules_built_in_code_compile_like_parsed_ones() {
    let first = ReplacementRule::new("<A>", "<B>")
        .expect("rule")
        .with_stage(1)
        .internal();
    let second = ReplacementRule::new("x", "<A>")
        .expect("rule")
        .with_stage(2);
    let rules = ReplacementRuleSet::new(vec![second, first]).expect("rule set");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules.apply("x"), "<B>");
}
