//! End-to-end extraction tests on inline HTML documents.

use procura_core::{Extractor, FieldName, FieldOverride, FieldSchema, Record, SchemaOverrides};
use scraper::Html;
use std::sync::Arc;

fn extract(html: &str) -> Record {
    Extractor::default().extract_html(html).unwrap()
}

// ============ WHOLE DOCUMENTS ============

#[test]
fn test_minimal_result_notice() {
    let record = extract(
        "<p>项目名称：测试采购项目</p><p>采购人名称：某市财政局</p>\
         <table><tr><th>供应商名称</th><th>中标金额</th></tr>\
         <tr><td>某某科技有限公司</td><td>50万元</td></tr></table>",
    );
    assert_eq!(record.get(FieldName::ProjectName), "测试采购项目");
    assert_eq!(record.get(FieldName::PurchaserName), "某市财政局");
    assert_eq!(record.get(FieldName::SupplierName), "某某科技有限公司");
    assert_eq!(record.get(FieldName::AwardAmount), "500000.00");
    assert_eq!(record.get(FieldName::Category), "其他");
    assert_eq!(record.get(FieldName::SupplierAddress), "");
}

#[test]
fn test_full_announcement() {
    let html = r#"<html><head>
        <meta name="ArticleTitle" content="某市第一中学实验室设备采购项目中标公告">
        <meta name="PubDate" content="2023-07-15">
        </head><body>
        <div class="content">
          <h2>一、项目编号：ZB-2023-001</h2>
          <p>二、项目名称：某市第一中学实验室设备采购项目</p>
          <p>三、中标信息</p>
          <table>
            <tr><td>供应商名称</td><td>某某仪器设备有限公司</td></tr>
            <tr><td>供应商地址</td><td>某省某市某区科技路18号</td></tr>
            <tr><td>中标（成交）金额</td><td>人民币 1,280,000.00 元</td></tr>
          </table>
          <p>四、主要标的信息</p>
          <table>
            <tr><th>序号</th><th>标的名称</th><th>品牌</th><th>数量</th></tr>
            <tr><td>1</td><td>学生实验台</td><td>某牌</td><td>50</td></tr>
          </table>
          <p>五、采购人信息<br>采购人名称：某市第一中学<br>采购人地址：某市某区学府路1号</p>
          <p>六、采购代理机构信息<br>名 称：某招标代理有限公司<br>地 址：某市某区代理大厦9层</p>
          <p>采购类别：货物类</p>
        </div></body></html>"#;

    let record = extract(html);
    assert_eq!(record.get(FieldName::AnnouncementDate), "2023年07月15日");
    assert_eq!(
        record.get(FieldName::ProjectName),
        "某市第一中学实验室设备采购项目中标公告"
    );
    assert_eq!(record.get(FieldName::PurchaserName), "某市第一中学");
    assert_eq!(record.get(FieldName::PurchaserAddress), "某市某区学府路1号");
    assert_eq!(record.get(FieldName::SupplierName), "某某仪器设备有限公司");
    assert_eq!(record.get(FieldName::SupplierAddress), "某省某市某区科技路18号");
    assert_eq!(record.get(FieldName::AwardAmount), "1280000.00");
    assert_eq!(record.get(FieldName::Category), "货物");
    assert_eq!(record.get(FieldName::SubjectMatter), "学生实验台");
}

// ============ NORMALIZATION THROUGH THE PIPELINE ============

#[test]
fn test_amount_forms() {
    let record = extract("<p>中标金额：195.5万元</p>");
    assert_eq!(record.get(FieldName::AwardAmount), "1955000.00");

    let record = extract("<p>成交金额：1,980,000元</p>");
    assert_eq!(record.get(FieldName::AwardAmount), "1980000.00");
}

#[test]
fn test_date_forms() {
    let record = extract("<p>发布时间:2021/5/4</p>");
    assert_eq!(record.get(FieldName::AnnouncementDate), "2021年05月04日");

    let record = extract("<p>发布时间：另行通知</p>");
    assert_eq!(record.get(FieldName::AnnouncementDate), "");
}

#[test]
fn test_fullwidth_digits() {
    let record = extract("<p>中标金额：５０万元</p><p>发布时间：２０２１年５月４日</p>");
    assert_eq!(record.get(FieldName::AwardAmount), "500000.00");
    assert_eq!(record.get(FieldName::AnnouncementDate), "2021年05月04日");
}

#[test]
fn test_explicit_category_beats_keywords() {
    let record = extract("<p>采购类别：设备维护服务（货物类）</p>");
    assert_eq!(record.get(FieldName::Category), "货物");
}

#[test]
fn test_keyword_category_single_valued_by_default() {
    let record = extract("<p>采购类别：设备维护</p>");
    assert_eq!(record.get(FieldName::Category), "货物");
}

#[test]
fn test_keyword_categories_when_multi_valued() {
    let mut overrides = SchemaOverrides::new();
    overrides.insert(
        "采购类别".to_string(),
        FieldOverride {
            multi: Some(true),
            ..Default::default()
        },
    );
    let schema = Arc::new(FieldSchema::with_overrides(&overrides).unwrap());
    let record = Extractor::new(schema)
        .extract_html("<p>采购类别：设备维护</p>")
        .unwrap();
    assert_eq!(record.get(FieldName::Category), "货物|服务");
}

// ============ CONFLICT RESOLUTION ============

#[test]
fn test_placeholder_loses_to_real_value() {
    let record = extract(
        "<p>供应商地址：详见附件</p><p>供应商地址：某市某区某路8号</p>",
    );
    assert_eq!(record.get(FieldName::SupplierAddress), "某市某区某路8号");
}

#[test]
fn test_version_string_loses_subject_matter() {
    let record = extract(
        "<p>采购标的：数据中心服务器（V2.0版）</p><p>采购标的：数据中心服务器</p>",
    );
    assert_eq!(record.get(FieldName::SubjectMatter), "数据中心服务器");
}

#[test]
fn test_rank_gated_table_keeps_winner_row() {
    let record = extract(
        "<table>\
         <tr><th>排名</th><th>供应商名称</th><th>供应商地址</th><th>投标报价</th></tr>\
         <tr><td>2</td><td>乙建设工程集团有限公司</td><td>乙市乙区乙路20号</td><td>90万元</td></tr>\
         <tr><td>1</td><td>甲科技有限公司</td><td>甲市甲区甲路1号</td><td>95万元</td></tr>\
         </table>",
    );
    assert_eq!(record.get(FieldName::SupplierName), "甲科技有限公司");
    assert_eq!(record.get(FieldName::SupplierAddress), "甲市甲区甲路1号");
}

#[test]
fn test_agency_section_address_is_not_the_purchaser_address() {
    let record = extract(
        "<p>二、采购代理机构信息<br>采购人地址：代理大厦5层<br>\
         三、项目联系方式<br>采购人地址：某市某区某路1号</p>",
    );
    assert_eq!(record.get(FieldName::PurchaserAddress), "某市某区某路1号");
}

#[test]
fn test_agency_address_then_purchaser_address_in_one_block() {
    let record = extract(
        "<p>代理机构地址：某市某区代理路5号<br>采购单位地址：某市某区代理路5号<br>\
         三、采购人信息<br>采购单位地址：某市某区学府路1号</p>",
    );
    assert_eq!(record.get(FieldName::PurchaserAddress), "某市某区学府路1号");
}

#[test]
fn test_agency_row_in_two_column_table() {
    let record = extract(
        "<table>\
         <tr><td>采购人名称</td><td>某市财政局</td></tr>\
         <tr><td>代理机构名称</td><td>某招标代理有限公司</td></tr>\
         <tr><td>采购人地址</td><td>某市某区代理大厦5层2号</td></tr>\
         <tr><td>采购人名称</td><td>某市财政局</td></tr>\
         <tr><td>采购人地址</td><td>某市某区某路1号</td></tr>\
         </table>",
    );
    assert_eq!(record.get(FieldName::PurchaserAddress), "某市某区某路1号");
}

#[test]
fn test_merged_supplier_cell_spans_rows() {
    let record = extract(
        "<table>\
         <tr><th>供应商名称</th><th>包号</th><th>中标金额</th></tr>\
         <tr><td rowspan=\"2\">某某科技有限公司</td><td>包1</td><td>10万元</td></tr>\
         <tr><td>包2</td><td>20万元</td></tr>\
         </table>",
    );
    assert_eq!(record.get(FieldName::SupplierName), "某某科技有限公司");
    assert_eq!(record.get(FieldName::AwardAmount), "100000.00");
}

// ============ DOCUMENT PROPERTIES ============

#[test]
fn test_every_field_present_in_empty_document() {
    for html in ["<html><body></body></html>", "", "  \n "] {
        let record = extract(html);
        for (field, value) in record.iter() {
            if field == FieldName::Category {
                assert_eq!(value, "其他");
            } else {
                assert_eq!(value, "", "{field} should be empty");
            }
        }
    }
}

#[test]
fn test_deeply_nested_document() {
    let depth = 20_000;
    let record = extract(&format!(
        "{}<p>项目名称：深层项目</p>{}",
        "<div>".repeat(depth),
        "</div>".repeat(depth)
    ));
    assert_eq!(record.get(FieldName::ProjectName), "深层项目");
}

#[test]
fn test_table_with_huge_spans() {
    let cell = format!("<td rowspan=\"1000\" colspan=\"1000\">{}</td>", "某".repeat(200));
    let record = extract(&format!(
        "<p>项目名称：合并单元格项目</p><table><tr>{cell}{cell}</tr></table>"
    ));
    assert_eq!(record.get(FieldName::ProjectName), "合并单元格项目");
}

#[test]
fn test_same_tree_twice_gives_same_record() {
    let document = Html::parse_document(
        "<p>项目名称：某项目</p><table><tr><td>供应商名称</td><td>某公司</td></tr></table>",
    );
    let extractor = Extractor::default();
    let first = extractor.extract_document(&document).unwrap();
    let second = extractor.extract_document(&document).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_scripts_are_not_content() {
    let record = extract(
        "<p>项目名称：真实项目</p><script>var s = '供应商名称：脚本公司';</script>",
    );
    assert_eq!(record.get(FieldName::ProjectName), "真实项目");
    assert_eq!(record.get(FieldName::SupplierName), "");
}
