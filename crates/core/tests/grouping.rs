use affixlist_core::{
    group_affixes, parse_affix_text, Affix, AffixKind, EquipMode, Placement, AffixSet,
};

fn affix_text(name: &str, weight: i32, min: f64, max: f64, level: i32) -> String {
    format!(
        "<STRING>NAME:{name}\n<INTEGER>WEIGHT:{weight}\n<INTEGER>MIN_SPAWN_RANGE:{level}\n\
         <STRING>UNITTYPE:RING\n<STRING>UNITTYPE:AMULET\n\
         [EFFECT]\n<STRING>TYPE:ARMOR_BONUS\n<FLOAT>MIN:{min}\n<FLOAT>MAX:{max}\n<INTEGER>LEVEL:{level}\n[/EFFECT]\n\
         [EFFECT]\n<STRING>TYPE:HEALTH_BONUS\n<STRING>DURATION:5\n<FLOAT>MIN:{min}\n[/EFFECT]\n"
    )
}

fn parse(text: &str, source: &str) -> Affix {
    parse_affix_text(text, source).affix
}

#[test]
fn intensity_does_not_change_the_group() {
    let weak = parse(&affix_text("JEWEL_ARMOR_1", 10, 1.0, 2.0, 5), "a.dat");
    let strong = parse(&affix_text("JEWEL_ARMOR_9", 3, 40.0, 80.0, 60), "b.dat");
    assert!(weak.is_in_affix_group(&strong));
    assert_eq!(weak.to_group().id(), strong.to_group().id());
}

#[test]
fn different_effect_kinds_split_groups() {
    let armor = parse(&affix_text("ARMOR_1", 10, 1.0, 2.0, 5), "a.dat");
    let other = parse(
        &affix_text("ARMOR_1", 10, 1.0, 2.0, 5).replace("ARMOR_BONUS", "DODGE_BONUS"),
        "b.dat",
    );
    assert!(!armor.is_in_affix_group(&other));
}

#[test]
fn timing_is_part_of_the_group() {
    let timed = parse(&affix_text("ARMOR_1", 10, 1.0, 2.0, 5), "a.dat");
    let untimed = parse(
        &affix_text("ARMOR_1", 10, 1.0, 2.0, 5).replace("DURATION:5", "DURATION:ALWAYS"),
        "b.dat",
    );
    assert!(!timed.is_in_affix_group(&untimed));
}

#[test]
fn set_buckets_skip_zero_weight_and_group_the_rest() {
    let affixes = vec![
        parse(&affix_text("RING_ARMOR_1", 10, 1.0, 2.0, 5), "1.dat"),
        parse(&affix_text("RING_ARMOR_2", 8, 3.0, 4.0, 15), "2.dat"),
        parse(&affix_text("RING_ARMOR_3", 0, 5.0, 6.0, 25), "3.dat"),
        parse("<STRING>NAME:BARE\n<INTEGER>WEIGHT:1\n", "bare.dat"),
    ];
    let set = group_affixes(affixes);
    assert_eq!(set.zero_weight_count(), 1);
    assert_eq!(set.group_count(), 1);
    assert_eq!(set.ungrouped_count(), 1);
    let (group, members) = set.similar_groups().next().expect("one similar group");
    assert_eq!(group.kind, AffixKind::Item);
    assert_eq!(group.equip_types, vec!["RING", "AMULET"]);
    assert_eq!(members.len(), 2);
}

#[test]
fn equip_type_order_matters() {
    let mut first = Affix::new("x.dat");
    first.weight = 1;
    first.add_equip_type("RING", EquipMode::Allowed);
    first.add_equip_type("AMULET", EquipMode::Allowed);
    let mut second = Affix::new("y.dat");
    second.weight = 1;
    second.add_equip_type("AMULET", EquipMode::Allowed);
    second.add_equip_type("RING", EquipMode::Allowed);

    let mut set = AffixSet::new();
    assert_eq!(set.add_affix_by_contents(first), Placement::Grouped);
    assert_eq!(set.add_affix_by_contents(second), Placement::Grouped);
    assert_eq!(set.group_count(), 2);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn numbers_never_change_the_group(
            min_a in -100i32..100, max_a in -100i32..100, level_a in 1i32..100,
            min_b in -100i32..100, max_b in -100i32..100, level_b in 1i32..100,
        ) {
            let a = parse(
                &affix_text("A_1", 5, f64::from(min_a), f64::from(max_a), level_a),
                "a.dat",
            );
            let b = parse(
                &affix_text("A_2", 5, f64::from(min_b), f64::from(max_b), level_b),
                "b.dat",
            );
            prop_assert_eq!(a.to_group(), b.to_group());
        }
    }
}
