use affixlist_core::{Affix, AffixSet, RenderContext};

/// Lists every group with more than one member: a header naming the group
/// and its summary, then each member's short description, lowest level range
/// first.
pub fn similar_affixes_report(set: &AffixSet, ctx: &RenderContext) -> String {
    let mut out = String::new();
    let mut diagnostics = Vec::new();

    for (group, affixes) in set.similar_groups() {
        let mut members: Vec<&Affix> = affixes.iter().collect();
        members.sort_by(|lhs, rhs| {
            lhs.spawn_range
                .cmp(&rhs.spawn_range)
                .then_with(|| lhs.name().cmp(rhs.name()))
        });

        out.push_str(&format!(
            "Group ID {:016x} ({} affixes)\t{}",
            group.id(),
            members.len(),
            group.summary()
        ));
        for affix in members {
            let short = ctx.describe_affix_short(affix, &mut diagnostics);
            out.push('\t');
            out.push_str(&short.trim_end_matches('\n').replace('\n', "\n\t"));
            out.push('\n');
        }
        out.push('\n');
    }

    if !diagnostics.is_empty() {
        tracing::debug!(count = diagnostics.len(), "diagnostics while writing group report");
    }
    out
}
