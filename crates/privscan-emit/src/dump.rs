//! Textual dump of a function's classification.
//!
//! Each loop is printed in pre-order behind its start location (or name when the location is
//! unknown), indented by its depth. Under it, every category with members gets a keyword line,
//! followed by one line per alias node in that category listing the node's memory as
//! `<name, size>` and its unknown accesses as `<callee>`.

use crate::{
    config::DumpConfig,
    emitter::{EmitContext, EmitHelper, EmitResult, Emitter},
    output::{JsonFormatter, OutputFormat},
    report::{memory_label, unknown_name, FunctionReport},
};
use colored::Color;
use privscan_analysis::{AliasTrait, DependencySet, PrivateInfo, Statistics, TraitFlags};
use privscan_core::{AliasTree, Function, RegionId};
use std::io::Write;

pub struct TraitDumper<'a> {
    function: &'a Function,
    config: DumpConfig,
}

impl<'a> TraitDumper<'a> {
    pub fn new(function: &'a Function) -> Self {
        Self::with_config(function, DumpConfig::default())
    }

    pub fn with_config(function: &'a Function, config: DumpConfig) -> Self {
        Self { function, config }
    }

    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    pub fn report(&self, info: &PrivateInfo) -> FunctionReport {
        FunctionReport::new(
            self.function,
            info,
            self.config.include_unknowns,
            self.config.include_statistics,
        )
    }

    fn emit_loop<W: Write>(
        &self,
        tree: &AliasTree,
        region: RegionId,
        set: &DependencySet,
        writer: &mut W,
        context: &EmitContext,
    ) -> EmitResult {
        let region = self.function.regions.get(region);
        let ctx = context.at_depth(region.depth);
        let label = match &region.start {
            Some(start) => start.to_string(),
            None => region.name.clone(),
        };
        EmitHelper::write_colored_line(writer, &ctx, &label, Color::Yellow)?;

        let top = tree.top_level_node();
        for (category, keyword) in TraitFlags::CATEGORIES {
            let lines: Vec<String> = set
                .iter()
                .filter(|alias_trait| alias_trait.node != top)
                .filter(|alias_trait| alias_trait.descriptor.is(category))
                .map(|alias_trait| self.members(tree, alias_trait, category))
                .filter(|members| !members.is_empty())
                .map(|members| members.join(" "))
                .collect();
            if lines.is_empty() {
                continue;
            }
            EmitHelper::write_colored_line(writer, &ctx, &format!(" {}:", keyword), Color::Cyan)?;
            for line in lines {
                EmitHelper::write_line(writer, &ctx, &format!("  {}", line))?;
            }
        }
        Ok(())
    }

    /// Memory of the node listed under `category`. Address access lists only the memory whose
    /// address escapes; every other category lists all memory the loop touches.
    fn members(&self, tree: &AliasTree, alias_trait: &AliasTrait, category: TraitFlags) -> Vec<String> {
        let listed = |flags: TraitFlags| {
            if category == TraitFlags::ADDRESS_ACCESS {
                flags.contains(TraitFlags::ADDRESS_ACCESS)
            } else {
                !flags.contains(TraitFlags::NO_ACCESS)
            }
        };
        let mut members: Vec<String> = alias_trait
            .memories
            .iter()
            .filter(|memory| listed(memory.descriptor.flags()))
            .map(|memory| memory_label(self.function, tree, memory.memory))
            .collect();
        if self.config.include_unknowns {
            members.extend(
                alias_trait
                    .unknowns
                    .iter()
                    .filter(|unknown| listed(unknown.descriptor.flags()))
                    .map(|unknown| format!("<{}>", unknown_name(self.function, unknown.inst))),
            );
        }
        members
    }

    fn emit_statistics<W: Write>(
        &self,
        statistics: &Statistics,
        writer: &mut W,
        context: &EmitContext,
    ) -> EmitResult {
        EmitHelper::write_section(writer, context, "statistics")?;
        for (name, count) in statistics.entries() {
            if count > 0 {
                EmitHelper::write_line(writer, context, &format!("{}: {}", name, count))?;
            }
        }
        Ok(())
    }
}

impl Emitter for TraitDumper<'_> {
    type Item = PrivateInfo;

    fn emit<W: Write>(
        &self,
        info: &PrivateInfo,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        if self.config.format == OutputFormat::Json {
            return JsonFormatter::format_object(writer, &self.report(info));
        }
        context.use_colors = self.config.use_colors;
        context.indent_chars = self.config.indent.unit();

        EmitHelper::write_section(writer, context, &self.function.name)?;
        if let Some(tree) = &self.function.alias_tree {
            for (region, set) in info.iter() {
                self.emit_loop(tree, region, set, writer, context)?;
            }
        }
        if self.config.include_statistics {
            self.emit_statistics(info.statistics(), writer, context)?;
        }
        Ok(())
    }
}
