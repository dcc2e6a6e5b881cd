use affixlist_core::{
    parse_affix_text, Diagnostic, Effect, RenderContext, RenderOptions, ReplacementRuleSet,
    TemplateRepository, TemplateTable,
};

fn context(instant: &str, timed: &str, rules: &str) -> RenderContext {
    RenderContext::new(
        TemplateRepository::new(
            TemplateTable::parse(instant).expect("instant table"),
            TemplateTable::parse(timed).expect("timed table"),
        ),
        ReplacementRuleSet::parse(rules).expect("rule list"),
        RenderOptions::default(),
    )
}

fn effect(effect_type: &str, min: f64, max: f64) -> Effect {
    let mut effect = Effect::new("test.dat");
    effect.group.effect_type = Some(effect_type.to_string());
    effect.min_value = min;
    effect.max_value = max;
    effect
}

// ── End to end ──

#[test]
fn fire_damage_renders_max_clause() {
    let ctx = context("FIRE_DMG\nDeals <C|%.0f|%.0f> fire damage\n", "", "");
    let mut fire = effect("FIRE_DMG", 10.0, 20.0);
    fire.group.damage_type = "fire".to_string();
    let mut sink = Vec::new();
    assert_eq!(ctx.render_effect(&fire, &mut sink), "Deals 20 fire damage");
    assert!(sink.is_empty(), "{:?}", sink);
}

#[test]
fn parsed_affix_renders_through_rules() {
    let ctx = context(
        "# instant\nFIRE_DMG\n<C|Lose|Gain> <MIN>-<MAX> <DMGTYPE> damage\n",
        "FIRE_DMG\n<C|Lose|Gain> <MIN> <DMGTYPE> damage over <DUR> seconds\n",
        "<MIN>\n%1\\$.0f\n<MAX>\n%2\\$.0f\n<DUR>\n%3\\$.1f\n<DMGTYPE>\n%4\\$s\n",
    );
    let parsed = parse_affix_text(
        "<STRING>NAME:BURNING\n\
         [EFFECT]\n<STRING>TYPE:FIRE_DMG\n<STRING>DAMAGE_TYPE:FIRE\n<FLOAT>MIN:3\n<FLOAT>MAX:7\n[/EFFECT]\n\
         [EFFECT]\n<STRING>TYPE:FIRE_DMG\n<STRING>DAMAGE_TYPE:FIRE\n<FLOAT>MIN:-2\n<FLOAT>MAX:-2\n<FLOAT>DURATION:4\n[/EFFECT]\n",
        "burning.dat",
    );
    let mut sink = Vec::new();
    let mut lines: Vec<String> = parsed
        .affix
        .effects
        .iter()
        .map(|effect| ctx.render_effect(effect, &mut sink))
        .collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            "Gain 3-7 fire damage".to_string(),
            "Lose 2 fire damage over 4.0 seconds".to_string(),
        ]
    );
    assert!(sink.is_empty(), "{:?}", sink);
}

// ── Clause boundaries ──

macro_rules! clause_case {
    ($name:ident, $min:expr, $max:expr, $expected:expr) => {
        #[test]
        fn $name() {
            let ctx = context("PICK\n<C|X|Y>\n", "", "");
            let mut sink = Vec::new();
            let text = ctx.render_effect(&effect("PICK", $min, $max), &mut sink);
            assert_eq!(text, $expected);
            assert!(sink.is_empty(), "{:?}", sink);
        }
    };
}

clause_case!(clause_zero_zero_takes_first, 0.0, 0.0, "X");
clause_case!(clause_zero_positive_takes_second, 0.0, 5.0, "Y");
clause_case!(clause_negative_takes_first, -4.0, -1.0, "X");
clause_case!(clause_negative_zero_takes_first, -4.0, 0.0, "X");

#[test]
fn mixed_sign_clause_stays_and_is_reported() {
    let ctx = context("PICK\n<C|X|Y>\n", "", "");
    let mut sink = Vec::new();
    let text = ctx.render_effect(&effect("PICK", -3.0, 5.0), &mut sink);
    assert_eq!(text, "<C|X|Y>");
    assert_eq!(
        sink,
        vec![Diagnostic::UnresolvedClause {
            effect_type: "PICK".to_string(),
            text: "<C|X|Y>".to_string(),
        }]
    );
}

#[test]
fn leftover_angle_brackets_are_reported() {
    let ctx = context("ODD\nDeals <DMG> damage\n", "", "");
    let mut sink = Vec::new();
    let text = ctx.render_effect(&effect("ODD", 1.0, 1.0), &mut sink);
    assert_eq!(text, "Deals <DMG> damage");
    assert!(matches!(
        sink.as_slice(),
        [Diagnostic::MalformedTemplate { timed: false, .. }]
    ));
}

#[test]
fn mixed_sign_per_target_clause_stays_and_is_reported() {
    let ctx = context("SPLIT\n<MC|a|b> x\n", "", "");
    let mut split = effect("SPLIT", 1.0, 1.0);
    split.min_per = -1.0;
    split.max_per = 2.0;
    split.group.exclusive = true;
    split.group.graph_override = Some("G".to_string());
    let mut sink = Vec::new();
    let text = ctx.render_effect(&split, &mut sink);
    assert_eq!(text, "<MC|a|b> x (Exclusive) (Uses G graph)");
    assert_eq!(
        sink,
        vec![Diagnostic::UnresolvedClause {
            effect_type: "SPLIT".to_string(),
            text: "<MC|a|b> x".to_string(),
        }]
    );
}

// ── Descriptors ──

#[test]
fn descriptors_follow_a_fixed_order() {
    let ctx = context("BURN\nBurns\n", "", "");
    let mut burn = effect("BURN", 1.0, 1.0);
    burn.group.name = Some("EMBERS".to_string());
    burn.group.exclusive = true;
    burn.group.graph_override = Some("FAST".to_string());
    burn.group.owner_level = true;
    burn.soak_scale = 0.75;
    burn.level = 3;
    burn.group.stat_name = Some("DEX".to_string());
    burn.stat_percent = 12.5;
    burn.group.is_stat_bonus = true;
    burn.group.use_graph = false;
    let mut sink = Vec::new();
    assert_eq!(
        ctx.render_effect(&burn, &mut sink),
        "Burns (named EMBERS) (Exclusive) (Uses FAST graph) (Uses owner level for graph) \
         (25.00% reduced effectiveness of armor) (Level 3) (12.50% of stat DEX, as bonus) \
         (Ignoring graph)"
    );
    assert!(sink.is_empty(), "{:?}", sink);
}

// ── Timed lookups ──

#[test]
fn timed_effect_improvises_from_instant_template() {
    let ctx = context(
        "SLOW\nSlows by %2$.0f%%\n",
        "",
        "<DUR>\n%3\\$.0f\n",
    );
    let mut slow = effect("SLOW", 10.0, 25.0);
    slow.duration = 3.0;
    slow.group.has_duration = true;
    let mut sink = Vec::new();
    assert_eq!(
        ctx.render_effect(&slow, &mut sink),
        "Slows by 25% for 3 seconds"
    );
    assert_eq!(
        sink,
        vec![Diagnostic::ImprovisedTemplate {
            effect_type: "SLOW".to_string()
        }]
    );
}

#[test]
fn timed_miss_without_instant_is_missing() {
    let ctx = context("", "", "");
    let mut slow = effect("SLOW", 1.0, 1.0);
    slow.group.has_duration = true;
    slow.duration = 2.0;
    let mut sink = Vec::new();
    let text = ctx.render_effect(&slow, &mut sink);
    assert_eq!(
        text,
        "No effect details for effect SLOW with parameters (min 1.00, max 1.00, dur 2.00, type physical, level -1)"
    );
    assert_eq!(sink.len(), 1);
    assert_eq!(
        sink[0].to_string(),
        format!("TIMED: {}", text)
    );
}

// ── Argument tuple ──

#[test]
fn every_positional_argument_is_available() {
    let ctx = context(
        "ALL\n%1$.0f %2$.0f %3$.0f %4$s %5$d %6$.0f %7$s %8$.0f %9$.0f %10$.0f %11$.0f %12$.1f\n",
        "",
        "",
    );
    let mut all = effect("ALL", -1.0, -2.0);
    all.duration = 3.0;
    all.group.damage_type = "POISON".to_string();
    all.level = 5;
    all.resist = 6.0;
    all.group.name = Some("N".to_string());
    all.min_per = -8.0;
    all.max_per = 9.0;
    all.range = 10.0;
    all.max_count = 11.0;
    all.pulse = 1.5;
    let text = ctx.render_effect(&all, &mut Vec::new());
    assert_eq!(
        text,
        "1 2 3 poison 5 6 N 8 9 10 11 1.5 (named N) (Level 5)"
    );
}

#[test]
fn affix_rendering_joins_effect_lines() {
    let ctx = context("A\nfirst\nB\nsecond\n", "", "");
    let parsed = parse_affix_text(
        "[EFFECT]\n<STRING>TYPE:A\n[/EFFECT]\n[EFFECT]\n<STRING>TYPE:B\n[/EFFECT]\n",
        "pair.dat",
    );
    let mut sink = Vec::new();
    let text = ctx.render_affix(&parsed.affix, &mut sink);
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    assert_eq!(lines, vec!["first", "second"]);
}

#[test]
fn long_description_lists_every_section() {
    let ctx = context("FIRE_DMG\n+%2$.0f fire\n", "", "");
    let parsed = parse_affix_text(
        "<STRING>NAME:HERO_FIRE\n<INTEGER>WEIGHT:7\n<INTEGER>MIN_SPAWN_RANGE:5\n\
         <TRANSLATE>PREFIX:Fiery [ITEM]\n<STRING>UNITTYPE:SWORD\n[NOT_UNITTYPES]\n\
         <STRING>UNITTYPE:STAFF\n[EFFECT]\n<STRING>TYPE:FIRE_DMG\n<FLOAT>MAX:9\n[/EFFECT]\n",
        "hero_fire.dat",
    );
    let text = ctx.describe_affix(&parsed.affix, &mut Vec::new());
    assert_eq!(
        text,
        "Personal Affix: HERO_FIRE\n\
         \tPrefix: Fiery [ITEM]\n\
         \tMinimum Level: 5\n\
         \tSpawn Weight: 7\n\
         \tOccupies no slots\n\
         \tSpawns On: [SWORD]\n\
         \tCan't Spawn On: [STAFF]\n\
         \tEffects: \n\
         \t\t+9 fire\n"
    );
}

#[test]
fn short_description_has_range_and_weight() {
    let ctx = context("", "", "");
    let parsed = parse_affix_text(
        "<STRING>NAME:PLAIN_3\n<INTEGER>WEIGHT:2\n<INTEGER>MAX_SPAWN_RANGE:30\n",
        "plain.dat",
    );
    assert_eq!(
        ctx.describe_affix_short(&parsed.affix, &mut Vec::new()),
        "PLAIN_3 (Max Level: 30, weight 2)\n"
    );
}
