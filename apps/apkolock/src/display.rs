//! Output rendering and formatting

use apkolock_ops::{LockReport, OperationResult, PublishReport, StreamsReport, TagsReport};
use apkolock_types::{ColorChoice, Diagnostic, PackageSpec, Severity};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render operation result
    pub fn render_result(&self, result: &OperationResult) -> io::Result<()> {
        if self.json_output {
            self.render_json(result)
        } else {
            self.render_table(result)
        }
    }

    /// Render as JSON
    fn render_json(&self, result: &OperationResult) -> io::Result<()> {
        let json = result.to_json().map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    /// Render as formatted text
    fn render_table(&self, result: &OperationResult) -> io::Result<()> {
        match result {
            OperationResult::LockReport(report) => self.render_lock_report(report),
            OperationResult::Tags(tags) => self.render_tags(tags),
            OperationResult::Streams(report) => self.render_streams(report),
            OperationResult::Published(report) => self.render_published(report),
            OperationResult::Success(message) => self.term.write_line(message),
        }
    }

    fn render_lock_report(&self, report: &LockReport) -> io::Result<()> {
        let archs: Vec<String> = report.index.archs.iter().map(ToString::to_string).collect();
        self.term.write_line(&format!(
            "{} {} ({})",
            self.bold("Locked configuration"),
            report.id.short(),
            archs.join(", ")
        ))?;

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Package").add_attribute(Attribute::Bold),
            Cell::new("Version").add_attribute(Attribute::Bold),
        ]);
        for entry in &report.index.contents.packages {
            let spec = PackageSpec::parse(entry);
            let version = match spec.pinned_version() {
                Some(version) => Cell::new(version),
                None => self.colored_cell("unpinned", Color::Red),
            };
            table.add_row(vec![Cell::new(&spec.name), version]);
        }
        self.term.write_line(&table.to_string())?;

        for (arch, config) in &report.archs {
            self.term.write_line(&format!(
                "  {arch}: {} packages",
                config.contents.packages.len()
            ))?;
        }

        if report.diagnostics.is_empty() {
            return Ok(());
        }
        self.term.write_line("")?;
        for diagnostic in &report.diagnostics {
            self.render_diagnostic(diagnostic)?;
        }
        Ok(())
    }

    fn render_diagnostic(&self, diagnostic: &Diagnostic) -> io::Result<()> {
        let label = match diagnostic.severity {
            Severity::Error => self.styled("error:", &Style::new().red().bold()),
            Severity::Warning => self.styled("warning:", &Style::new().yellow().bold()),
        };
        self.term
            .write_line(&format!("{label} {}", diagnostic.summary))?;
        if !diagnostic.detail.is_empty() {
            self.term.write_line(&format!("    {}", diagnostic.detail))?;
        }
        Ok(())
    }

    fn render_tags(&self, report: &TagsReport) -> io::Result<()> {
        if report.tags.is_empty() {
            return self
                .term
                .write_line(&format!("No version tags for {}", report.package));
        }
        for tag in &report.tags {
            self.term.write_line(tag)?;
        }
        Ok(())
    }

    fn render_streams(&self, report: &StreamsReport) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Component").add_attribute(Attribute::Bold),
            Cell::new("Stream").add_attribute(Attribute::Bold),
            Cell::new("Main").add_attribute(Attribute::Bold),
            Cell::new("Tags").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

        for (name, component) in &report.resolved {
            let stream = &component.stream;
            let mut status = Vec::new();
            if stream.is_latest {
                status.push("latest");
            }
            if stream.fips {
                status.push("fips");
            }
            if stream.eol {
                status.push("eol");
            }
            let status_cell = if stream.eol {
                self.colored_cell(&status.join(", "), Color::Red)
            } else {
                Cell::new(status.join(", "))
            };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(&component.version_stream_name),
                Cell::new(&stream.main),
                Cell::new(component.tags.join(" ")),
                status_cell,
            ]);
        }
        self.term.write_line(&table.to_string())?;

        for name in &report.unmatched {
            let label = self.styled("warning:", &Style::new().yellow().bold());
            self.term
                .write_line(&format!("{label} no version stream matches {name}"))?;
        }
        Ok(())
    }

    fn render_published(&self, report: &PublishReport) -> io::Result<()> {
        self.term.write_line(&report.reference)?;
        for (arch, reference) in &report.archs {
            self.term.write_line(&format!("  {arch}: {reference}"))?;
        }
        Ok(())
    }

    fn colored_cell(&self, text: &str, color: Color) -> Cell {
        if self.supports_color() {
            Cell::new(text).fg(color)
        } else {
            Cell::new(text)
        }
    }

    fn bold(&self, text: &str) -> String {
        self.styled(text, &Style::new().bold())
    }

    fn styled(&self, text: &str, style: &Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    pub fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}
