//! End-to-end integration tests for layout synthesis and report conversion

use reportcast_core::{
    convert_report, ConversionConfig, ConversionStatus, Expression, Field, FieldFormat, FieldKind,
    FrameKind, Group, ReportDefinition, Section, SectionRole, SortDirection, ValueKind,
    DETAIL_GROUP,
};

fn section(name: &str, role: SectionRole, height: f64) -> Section {
    Section {
        name: name.to_string(),
        role: Some(role),
        height,
        suppress: false,
        suppress_condition: None,
        group_index: None,
        fields: Vec::new(),
    }
}

fn field(name: &str, source: &str) -> Field {
    Field {
        name: name.to_string(),
        source: source.to_string(),
        kind: FieldKind::Column,
        x: 0.0,
        y: 0.0,
        width: 1440.0,
        height: 240.0,
        font: None,
        format: FieldFormat::default(),
        suppress_condition: None,
    }
}

fn orders_report() -> ReportDefinition {
    let mut group_header = section("Customer Header", SectionRole::GroupHeader, 360.0);
    group_header.group_index = Some(1);
    let mut group_footer = section("Customer Footer", SectionRole::GroupFooter, 240.0);
    group_footer.group_index = Some(1);

    let mut detail = section("Detail", SectionRole::Detail, 240.0);
    let mut amount = field("Amount", "orders.amount");
    amount.format.mask = Some("$#,##0.00".to_string());
    amount.format.suppress_if_zero = true;
    detail.fields.push(field("Order No", "orders.order_no"));
    detail.fields.push(amount);

    ReportDefinition {
        name: "orders by customer".to_string(),
        page_width: 12240.0,
        page_height: 15840.0,
        formulas: vec![
            Expression::new("Net", "{orders.amount} - {orders.discount}", ValueKind::Currency),
            Expression::new("Is Credit", "{orders.amount} < 0", ValueKind::Boolean),
        ],
        sections: vec![
            section("Page Header", SectionRole::PageHeader, 240.0),
            group_header,
            detail,
            group_footer,
            section("Page Footer", SectionRole::PageFooter, 240.0),
        ],
        groups: vec![Group {
            name: "Customer".to_string(),
            field_name: "orders.customer_id".to_string(),
            sort_direction: SortDirection::Ascending,
            keep_together: true,
            repeat_header: false,
        }],
    }
}

#[test]
fn test_full_report_conversion() {
    let conversion = convert_report(&orders_report(), &ConversionConfig::default());

    assert_eq!(conversion.stats.attempted, 2);
    assert_eq!(conversion.stats.converted, 2);
    assert_eq!(conversion.stats.failed, 0);
    assert_eq!(conversion.stats.status(), ConversionStatus::Success);
    assert_eq!(conversion.stats.completion_percent(), 100.0);

    // 2 formulas + 1 suppress-if-zero trigger
    assert_eq!(conversion.stats.triggers_generated, 1);
    assert_eq!(conversion.program_units.len(), 3);
}

#[test]
fn test_repeating_path_matches_group_order() {
    let conversion = convert_report(&orders_report(), &ConversionConfig::default());
    let body = conversion
        .layout
        .margin
        .children
        .iter()
        .find(|f| f.kind == FrameKind::Body)
        .expect("body frame");

    let path = body.repeating_path();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].source_group.as_deref(), Some("Customer"));
    assert_eq!(path[1].source_group.as_deref(), Some(DETAIL_GROUP));

    // Header and footer nest inside the group's repeating frame, around the
    // detail level
    let group_frame = path[0];
    assert_eq!(group_frame.children.len(), 3);
    assert_eq!(group_frame.children[0].kind, FrameKind::Header);
    assert_eq!(group_frame.children[1].kind, FrameKind::Repeating);
    assert_eq!(group_frame.children[2].kind, FrameKind::Trailer);

    // Body height: (360 + 240 + 240) twips in points
    assert_eq!(body.height, 42.0);
}

#[test]
fn test_output_fields_and_masks() {
    let conversion = convert_report(&orders_report(), &ConversionConfig::default());
    let body = conversion
        .layout
        .margin
        .children
        .iter()
        .find(|f| f.kind == FrameKind::Body)
        .expect("body frame");
    let detail = body.repeating_path()[1];

    assert_eq!(detail.fields.len(), 2);
    let amount = detail
        .fields
        .iter()
        .find(|f| f.name == "F_AMOUNT")
        .expect("amount field");
    assert_eq!(amount.source, "AMOUNT");
    assert_eq!(amount.format_mask.as_deref(), Some("FML999G999G990D00"));
    assert!(amount.visible);
    let trigger_name = amount.format_trigger.as_deref().expect("flag trigger");
    assert!(conversion
        .layout
        .triggers
        .iter()
        .any(|t| t.name == trigger_name));
}

#[test]
fn test_page_bands_surround_body() {
    let conversion = convert_report(&orders_report(), &ConversionConfig::default());
    let kinds: Vec<FrameKind> = conversion
        .layout
        .margin
        .children
        .iter()
        .map(|f| f.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![FrameKind::Header, FrameKind::Body, FrameKind::Trailer]
    );
}

#[test]
fn test_conversion_is_reproducible() {
    let config = ConversionConfig::default();
    let report = orders_report();
    let first = convert_report(&report, &config);
    let second = convert_report(&report, &config);

    let names = |c: &reportcast_core::ReportConversion| {
        c.program_units.iter().map(|u| u.name.clone()).collect::<Vec<_>>()
    };
    assert_eq!(names(&first), names(&second));
}
