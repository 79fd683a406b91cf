//! Static SVG snapshot of a positioned diagram.

use std::collections::HashMap;
use std::fmt::{self, Write};

use crate::measure::{Size, TableMetrics};
use crate::model::{Cardinality, Diagram, Relationship, Table};

const PADDING: f64 = 40.0;
const TEXT_INSET: f64 = 12.0;

#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    metrics: TableMetrics,
}

impl SvgRenderer {
    pub fn new(metrics: TableMetrics) -> Self {
        Self { metrics }
    }

    pub fn render(&self, diagram: &Diagram) -> String {
        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_diagram(&mut svg, diagram);
        svg
    }

    fn write_diagram(&self, svg: &mut String, diagram: &Diagram) -> fmt::Result {
        let boxes: HashMap<&str, (&Table, Size)> = diagram
            .tables
            .iter()
            .map(|t| (t.id.as_str(), (t, self.metrics.table_size(Some(t)))))
            .collect();

        let (min_x, min_y, max_x, max_y) = diagram.tables.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(x0, y0, x1, y1), t| {
                let size = self.metrics.table_size(Some(t));
                (
                    x0.min(t.x),
                    y0.min(t.y),
                    x1.max(t.x + size.width),
                    y1.max(t.y + size.height),
                )
            },
        );
        let (origin_x, origin_y, width, height) = if diagram.tables.is_empty() {
            (0.0, 0.0, 2.0 * PADDING, 2.0 * PADDING)
        } else {
            (
                min_x - PADDING,
                min_y - PADDING,
                max_x - min_x + 2.0 * PADDING,
                max_y - min_y + 2.0 * PADDING,
            )
        };

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="{origin_x} {origin_y} {width} {height}">"#
        )?;
        writeln!(
            svg,
            r#"<style>
  .table-bg {{ fill: #fff; }}
  .table-border {{ fill: none; stroke: #333; stroke-width: 1.5; }}
  .table-name {{ font-family: monospace; font-size: 14px; font-weight: bold; fill: #fff; }}
  .field-text {{ font-family: monospace; font-size: 12px; }}
  .field-type {{ font-family: monospace; font-size: 12px; fill: #666; }}
  .pk {{ font-weight: bold; }}
  .more {{ font-family: monospace; font-size: 12px; fill: #666; }}
  .edge {{ stroke: #666; stroke-width: 1.5; fill: none; }}
  .cardinality {{ font-family: monospace; font-size: 11px; fill: #333; }}
</style>"#
        )?;

        // Relationships go behind the tables
        for relationship in &diagram.relationships {
            let (Some(source), Some(target)) = (
                boxes.get(relationship.source_table_id.as_str()),
                boxes.get(relationship.target_table_id.as_str()),
            ) else {
                continue;
            };
            self.write_relationship(svg, relationship, *source, *target)?;
        }

        for table in &diagram.tables {
            self.write_table(svg, table)?;
        }

        writeln!(svg, "</svg>")
    }

    fn write_table(&self, svg: &mut String, table: &Table) -> fmt::Result {
        let Size { width, height } = self.metrics.table_size(Some(table));
        let (x, y) = (table.x, table.y);
        let header = self.metrics.header_height;

        writeln!(
            svg,
            r#"<rect class="table-bg" x="{x}" y="{y}" width="{width}" height="{height}" rx="4" />"#
        )?;
        writeln!(
            svg,
            r#"<rect x="{x}" y="{y}" width="{width}" height="{header}" rx="4" fill="{}" />"#,
            escape_xml(&table.color)
        )?;

        let name = self
            .metrics
            .truncate(&table.name, width - 2.0 * TEXT_INSET);
        writeln!(
            svg,
            r#"<text class="table-name" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            x + width / 2.0,
            y + header / 2.0 + 5.0,
            escape_xml(&name)
        )?;

        let row_height = self.metrics.field_height;
        let visible = self.metrics.visible_fields(table);
        for (row, field) in table.fields.iter().take(visible).enumerate() {
            let baseline = y + header + row as f64 * row_height + row_height / 2.0 + 4.0;
            let (class, marker) = if field.primary_key {
                ("field-text pk", "◆ ")
            } else {
                ("field-text", "")
            };
            let label = self.metrics.truncate(
                &format!("{marker}{}", field.name),
                width * 0.6 - TEXT_INSET,
            );
            writeln!(
                svg,
                r#"<text class="{class}" x="{}" y="{baseline}">{}</text>"#,
                x + TEXT_INSET,
                escape_xml(&label)
            )?;

            let mut type_name = field.data_type.name.clone();
            if field.is_array == Some(true) {
                type_name.push_str("[]");
            }
            let type_name = self.metrics.truncate(&type_name, width * 0.4 - TEXT_INSET);
            writeln!(
                svg,
                r#"<text class="field-type" x="{}" y="{baseline}" text-anchor="end">{}</text>"#,
                x + width - TEXT_INSET,
                escape_xml(&type_name)
            )?;
        }

        if self.metrics.has_footer(table) {
            let hidden = table.fields.len() - visible;
            writeln!(
                svg,
                r#"<text class="more" x="{}" y="{}" text-anchor="middle">+{hidden} more</text>"#,
                x + width / 2.0,
                y + height - self.metrics.footer_height / 2.0 + 4.0
            )?;
        }

        writeln!(
            svg,
            r#"<rect class="table-border" x="{x}" y="{y}" width="{width}" height="{height}" rx="4" />"#
        )
    }

    fn write_relationship(
        &self,
        svg: &mut String,
        relationship: &Relationship,
        (source, source_size): (&Table, Size),
        (target, target_size): (&Table, Size),
    ) -> fmt::Result {
        let (x1, y1) = center(source, source_size);
        let (x2, y2) = center(target, target_size);

        writeln!(
            svg,
            r#"<line class="edge" x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" />"#
        )?;

        let (dx, dy) = (x2 - x1, y2 - y1);
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return Ok(());
        }
        let (ux, uy) = (dx / len, dy / len);

        // Place the markers just outside each box along the line.
        let source_offset = source_size.width.min(source_size.height) / 2.0 + 12.0;
        let target_offset = target_size.width.min(target_size.height) / 2.0 + 12.0;
        writeln!(
            svg,
            r#"<text class="cardinality" x="{}" y="{}">{}</text>"#,
            x1 + ux * source_offset,
            y1 + uy * source_offset - 5.0,
            cardinality_symbol(relationship.source_cardinality)
        )?;
        writeln!(
            svg,
            r#"<text class="cardinality" x="{}" y="{}">{}</text>"#,
            x2 - ux * target_offset,
            y2 - uy * target_offset - 5.0,
            cardinality_symbol(relationship.target_cardinality)
        )
    }
}

fn center(table: &Table, size: Size) -> (f64, f64) {
    (table.x + size.width / 2.0, table.y + size.height / 2.0)
}

fn cardinality_symbol(c: Cardinality) -> &'static str {
    match c {
        Cardinality::One => "1",
        Cardinality::Many => "*",
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutEngine;
    use crate::model::DatabaseType;
    use crate::sql::{DdlImporter, Dialect, SchemaImporter};

    fn render(sql: &str) -> String {
        let diagram = DdlImporter::default()
            .import_sql(sql, Dialect::Generic, DatabaseType::Generic)
            .unwrap()
            .laid_out(&LayoutEngine::default());
        SvgRenderer::default().render(&diagram)
    }

    #[test]
    fn test_render_basic() {
        let svg = render("CREATE TABLE users (id INT PRIMARY KEY, name TEXT);");

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("users"));
        assert!(svg.contains("◆ id"));
        assert!(svg.contains(">text<"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn test_render_unicode() {
        let svg = render("CREATE TABLE ユーザー (名前 TEXT);");
        assert!(svg.contains("ユーザー"));
        assert!(svg.contains("名前"));
    }

    #[test]
    fn test_render_relationships() {
        let svg = render(
            r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, user_id INT REFERENCES users(id));
        "#,
        );
        assert_eq!(svg.matches(r#"class="edge""#).count(), 1);
        assert!(svg.contains(">*<"));
    }

    #[test]
    fn test_collapsed_table_footer() {
        let columns: Vec<String> = (0..13).map(|i| format!("c{i} INT")).collect();
        let svg = render(&format!("CREATE TABLE wide ({});", columns.join(", ")));

        assert!(svg.contains("+3 more"));
        assert!(svg.contains(">c9<"));
        assert!(!svg.contains(">c10<"));
    }

    #[test]
    fn test_escapes_names() {
        let svg = render(r#"CREATE TABLE "a<b" (id INT);"#);
        assert!(svg.contains("a&lt;b"));
    }

    #[test]
    fn test_empty_diagram() {
        let diagram = Diagram {
            id: "d".to_string(),
            name: "empty".to_string(),
            database_type: DatabaseType::Generic,
            created_at: 0,
            updated_at: 0,
            tables: Vec::new(),
            relationships: Vec::new(),
        };
        let svg = SvgRenderer::default().render(&diagram);
        assert!(svg.contains(r#"width="80""#));
    }
}
