//! Layout synthesis
//!
//! Converts the flat, typed section list and the ordered group list into
//! the target platform's hierarchical frame tree. The group list's order is
//! the single source of truth for nesting: recursion over the list by index
//! produces one repeating frame per group, with the detail-bound repeating
//! frame always the innermost leaf-level repeating node.
//!
//! Copyright (c) 2025 Reportcast Team
//! Licensed under the Apache-2.0 license

pub(crate) mod fields;

use crate::config::{sanitize_identifier, ConversionConfig};
use crate::translation::trigger::suppress_trigger;
use crate::translation::Translator;
use crate::types::{
    Elasticity, Frame, FrameKind, Group, LayoutResult, Section, SectionRole, Trigger,
    TriggerSequence, Warning, WarningCode, DETAIL_GROUP,
};
use crate::units::twips_to;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Builds the target frame tree from sections and groups
pub struct Synthesizer<'a> {
    config: &'a ConversionConfig,
}

/// Sections partitioned by effective role
struct Partition<'s> {
    report_headers: Vec<&'s Section>,
    page_headers: Vec<&'s Section>,
    group_headers: HashMap<usize, Vec<&'s Section>>,
    details: Vec<&'s Section>,
    group_footers: HashMap<usize, Vec<&'s Section>>,
    page_footers: Vec<&'s Section>,
    report_footers: Vec<&'s Section>,
}

/// Mutable collection state threaded through synthesis
struct Collector<'c> {
    sequence: &'c mut TriggerSequence,
    triggers: Vec<Trigger>,
    warnings: Vec<Warning>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(config: &'a ConversionConfig) -> Self {
        Self { config }
    }

    /// Synthesize the frame tree for one report
    ///
    /// Page dimensions are in twips. The caller owns the trigger sequence;
    /// reset it (or pass a fresh one) per report for reproducible names.
    pub fn synthesize(
        &self,
        sections: &[Section],
        groups: &[Group],
        page_width: f64,
        page_height: f64,
        translator: &Translator<'_>,
        sequence: &mut TriggerSequence,
    ) -> LayoutResult {
        let mut collector = Collector {
            sequence,
            triggers: Vec::new(),
            warnings: Vec::new(),
        };
        let partition = self.partition(sections, groups, &mut collector);

        let unit = self.config.target_unit;
        let width = twips_to(page_width, unit);
        let mut margin = self.frame("M_REPORT", FrameKind::Margin, 0.0, 0.0, width);
        margin.height = twips_to(page_height, unit);

        // Report headers stack at the top of the margin area
        let mut cursor = 0.0;
        for section in &partition.report_headers {
            let frame =
                self.section_frame(section, FrameKind::Header, cursor, width, translator, &mut collector);
            cursor += frame.height;
            margin.children.push(frame);
        }

        // Page-header band above the body
        if !partition.page_headers.is_empty() {
            let band = self.band(
                "M_PAGE_HEADER",
                FrameKind::Header,
                &partition.page_headers,
                cursor,
                width,
                translator,
                &mut collector,
            );
            cursor += band.height;
            margin.children.push(band);
        }

        // Body: group nesting recursion over the ordered group list
        let (body, body_height) =
            self.body_frame(&partition, groups, cursor, width, translator, &mut collector);
        cursor += body_height;
        margin.children.push(body);

        // Page-footer band below the body
        if !partition.page_footers.is_empty() {
            let band = self.band(
                "M_PAGE_FOOTER",
                FrameKind::Trailer,
                &partition.page_footers,
                cursor,
                width,
                translator,
                &mut collector,
            );
            cursor += band.height;
            margin.children.push(band);
        }

        // Report footers stack at the bottom
        for section in &partition.report_footers {
            let frame =
                self.section_frame(section, FrameKind::Trailer, cursor, width, translator, &mut collector);
            cursor += frame.height;
            margin.children.push(frame);
        }

        debug!(
            frames = margin.walk().len(),
            triggers = collector.triggers.len(),
            "synthesized frame tree"
        );

        LayoutResult {
            margin,
            triggers: collector.triggers,
            warnings: collector.warnings,
        }
    }

    fn partition<'s>(
        &self,
        sections: &'s [Section],
        groups: &[Group],
        collector: &mut Collector<'_>,
    ) -> Partition<'s> {
        let mut partition = Partition {
            report_headers: Vec::new(),
            page_headers: Vec::new(),
            group_headers: HashMap::new(),
            details: Vec::new(),
            group_footers: HashMap::new(),
            page_footers: Vec::new(),
            report_footers: Vec::new(),
        };
        for section in sections {
            if section.suppress {
                debug!(section = %section.name, "skipping statically suppressed section");
                continue;
            }
            if section.role.is_none() {
                collector.warnings.push(Warning::new(
                    WarningCode::DefaultedRole,
                    &section.name,
                    "Section carries no recognized role; inferred from its name",
                ));
            }
            match section.effective_role() {
                SectionRole::ReportHeader => partition.report_headers.push(section),
                SectionRole::PageHeader => partition.page_headers.push(section),
                SectionRole::Detail => partition.details.push(section),
                SectionRole::PageFooter => partition.page_footers.push(section),
                SectionRole::ReportFooter => partition.report_footers.push(section),
                SectionRole::GroupHeader | SectionRole::GroupFooter => {
                    let is_header = section.effective_role() == SectionRole::GroupHeader;
                    match section.group_index {
                        Some(index) if index >= 1 && index <= groups.len() => {
                            let map = if is_header {
                                &mut partition.group_headers
                            } else {
                                &mut partition.group_footers
                            };
                            map.entry(index).or_default().push(section);
                        }
                        declared => {
                            warn!(
                                section = %section.name,
                                index = ?declared,
                                "group section references no group in the list; level omitted"
                            );
                            collector.warnings.push(Warning::new(
                                WarningCode::MissingGroup,
                                &section.name,
                                "Group section references a group index not in the group list",
                            ));
                        }
                    }
                }
            }
        }
        partition
    }

    /// A band frame wrapping a run of same-role sections
    #[allow(clippy::too_many_arguments)]
    fn band(
        &self,
        name: &str,
        kind: FrameKind,
        sections: &[&Section],
        y: f64,
        width: f64,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) -> Frame {
        let mut band = self.frame(name, kind, 0.0, y, width);
        let mut cursor = 0.0;
        for section in sections {
            let frame = self.section_frame(section, kind, cursor, width, translator, collector);
            cursor += frame.height;
            band.children.push(frame);
        }
        band.height = cursor;
        band
    }

    /// The body frame and its nested group/detail repeating frames
    #[allow(clippy::too_many_arguments)]
    fn body_frame(
        &self,
        partition: &Partition<'_>,
        groups: &[Group],
        y: f64,
        width: f64,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) -> (Frame, f64) {
        let mut body = self.frame("M_BODY", FrameKind::Body, 0.0, y, width);
        let (child, height) =
            self.group_level(0, partition, groups, 0.0, width, translator, collector);
        if let Some(frame) = child {
            body.children.push(frame);
        }
        body.height = height;
        (body, height)
    }

    /// Recursive descent over the group list by index
    ///
    /// At `index == groups.len()` the detail sections become the innermost
    /// repeating frame bound to the detail sentinel. Otherwise one repeating
    /// frame is bound to `groups[index]`, nesting header sections, the next
    /// level, and footer sections in that order. Heights sum bottom-up as
    /// the recursion unwinds.
    #[allow(clippy::too_many_arguments)]
    fn group_level(
        &self,
        index: usize,
        partition: &Partition<'_>,
        groups: &[Group],
        y: f64,
        width: f64,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) -> (Option<Frame>, f64) {
        if index == groups.len() {
            return self.detail_frame(partition, y, width, translator, collector);
        }

        let group = &groups[index];
        let mut frame = self.frame(
            &format!("R_G_{}", sanitize_identifier(&group.name)),
            FrameKind::Repeating,
            0.0,
            y,
            width,
        );
        frame.source_group = Some(group.name.clone());
        frame.vertical_elasticity = Elasticity::Variable;

        let mut cursor = 0.0;
        if let Some(headers) = partition.group_headers.get(&(index + 1)) {
            for section in headers {
                let child =
                    self.section_frame(section, FrameKind::Header, cursor, width, translator, collector);
                cursor += child.height;
                frame.children.push(child);
            }
        }

        let (nested, nested_height) =
            self.group_level(index + 1, partition, groups, cursor, width, translator, collector);
        if let Some(child) = nested {
            frame.children.push(child);
        }
        cursor += nested_height;

        if let Some(footers) = partition.group_footers.get(&(index + 1)) {
            for section in footers {
                let child =
                    self.section_frame(section, FrameKind::Trailer, cursor, width, translator, collector);
                cursor += child.height;
                frame.children.push(child);
            }
        }

        frame.height = cursor;
        (Some(frame), cursor)
    }

    /// The innermost repeating frame, bound to the detail sentinel
    ///
    /// Detail section fields land directly on the repeating frame, stacked
    /// by running height when the report has more than one detail band.
    fn detail_frame(
        &self,
        partition: &Partition<'_>,
        y: f64,
        width: f64,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) -> (Option<Frame>, f64) {
        if partition.details.is_empty() {
            return (None, 0.0);
        }
        let unit = self.config.target_unit;
        let mut frame = self.frame("R_DETAIL", FrameKind::Repeating, 0.0, y, width);
        frame.source_group = Some(DETAIL_GROUP.to_string());
        frame.vertical_elasticity = Elasticity::Variable;

        let mut offset_twips = 0.0;
        for section in &partition.details {
            self.attach_section_trigger(section, &mut frame, translator, collector);
            for field in &section.fields {
                frame.fields.push(fields::convert_field(
                    field,
                    self.config,
                    unit,
                    offset_twips,
                    translator,
                    collector.sequence,
                    &mut collector.triggers,
                    &mut collector.warnings,
                ));
            }
            offset_twips += section.height;
        }
        frame.height = twips_to(offset_twips, unit);
        let height = frame.height;
        (Some(frame), height)
    }

    /// One frame per section, carrying its converted fields
    fn section_frame(
        &self,
        section: &Section,
        kind: FrameKind,
        y: f64,
        width: f64,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) -> Frame {
        let unit = self.config.target_unit;
        let mut frame = self.frame(
            &format!("M_{}", sanitize_identifier(&section.name)),
            kind,
            0.0,
            y,
            width,
        );
        frame.height = twips_to(section.height, unit);
        self.attach_section_trigger(section, &mut frame, translator, collector);
        for field in &section.fields {
            frame.fields.push(fields::convert_field(
                field,
                self.config,
                unit,
                0.0,
                translator,
                collector.sequence,
                &mut collector.triggers,
                &mut collector.warnings,
            ));
        }
        frame
    }

    fn attach_section_trigger(
        &self,
        section: &Section,
        frame: &mut Frame,
        translator: &Translator<'_>,
        collector: &mut Collector<'_>,
    ) {
        if let Some(condition) = section.suppress_condition.as_deref() {
            let trigger = suppress_trigger(
                translator,
                self.config,
                collector.sequence,
                &section.name,
                condition,
            );
            frame.format_trigger = Some(trigger.name.clone());
            collector.triggers.push(trigger);
        }
    }

    fn frame(&self, name: &str, kind: FrameKind, x: f64, y: f64, width: f64) -> Frame {
        Frame {
            name: name.to_string(),
            kind,
            source_group: None,
            x,
            y,
            width,
            height: 0.0,
            vertical_elasticity: Elasticity::Fixed,
            horizontal_elasticity: Elasticity::Fixed,
            print_direction: "DOWN".to_string(),
            format_trigger: None,
            children: Vec::new(),
            fields: Vec::new(),
        }
    }
}
