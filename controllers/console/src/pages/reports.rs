//! Reports page: report filter, trend chart and CSV/XLSX export.

use crate::error::ConsoleError;
use crate::pages::Notice;
use chrono::{DateTime, Days, NaiveDate, Utc};
use ipam_client::{DateRange, ExportFormat, IpamService, ReportFilter, ReportType, fallback};
use ipam_view::ValidationErrors;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Days covered by the default date range, ending today
pub const DEFAULT_RANGE_DAYS: u64 = 7;

/// Content type of the plain-text summary exported when the backend fails
pub const FALLBACK_CONTENT_TYPE: &str = "text/plain";

/// One point of the report chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub utilization: u32,
    pub security_events: u32,
}

/// A produced export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    /// True when the bytes are the local summary rather than the server's export
    pub is_fallback: bool,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its file name
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ConsoleError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// `ip-report-<type>-<from>-<format>.<format>`
pub fn export_file_name(filter: &ReportFilter, format: ExportFormat) -> String {
    format!(
        "ip-report-{}-{}-{}.{}",
        filter.report_type,
        filter.date_range.from.format("%Y-%m-%d"),
        format,
        format.extension()
    )
}

/// Default filter: usage report with details over the last week
pub fn default_filter(today: NaiveDate) -> ReportFilter {
    ReportFilter {
        date_range: DateRange {
            from: today.checked_sub_days(Days::new(DEFAULT_RANGE_DAYS)).unwrap_or(today),
            to: today,
        },
        report_type: ReportType::Usage,
        include_details: true,
    }
}

/// Reports page state
#[derive(Debug)]
pub struct ReportsPage {
    service: IpamService,
    filter: ReportFilter,
    chart: Vec<ReportRow>,
    notices: Vec<Notice>,
}

impl ReportsPage {
    /// Page with the default filter relative to `today`
    pub fn new(service: IpamService, today: NaiveDate) -> Self {
        Self {
            service,
            filter: default_filter(today),
            chart: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Active filter
    pub fn filter(&self) -> &ReportFilter {
        &self.filter
    }

    /// Choose the report category
    pub fn set_report_type(&mut self, report_type: ReportType) {
        self.filter.report_type = report_type;
    }

    /// Include per-host details in the export
    pub fn set_include_details(&mut self, include: bool) {
        self.filter.include_details = include;
    }

    /// Set the date range; `from` must not be after `to`
    pub fn set_range(&mut self, from: NaiveDate, to: NaiveDate) -> Result<(), ValidationErrors> {
        if from > to {
            let mut errors = ValidationErrors::default();
            errors.push("dateRange", "Start date must not be after end date");
            return Err(errors);
        }
        self.filter.date_range = DateRange { from, to };
        Ok(())
    }

    /// Notices produced so far, oldest first
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Rebuild the chart from the dashboard utilisation.
    ///
    /// The event count is derived from the utilisation so repeated loads agree.
    pub async fn load_chart(&mut self) -> &[ReportRow] {
        let overview = self.service.dashboard_overview().await;
        self.chart = overview
            .utilization_by_subnet
            .iter()
            .enumerate()
            .map(|(index, row)| ReportRow {
                name: row.subnet_name.clone(),
                utilization: row.usage,
                security_events: index as u32 + row.usage % 5,
            })
            .collect();
        &self.chart
    }

    /// Last built chart
    pub fn chart(&self) -> &[ReportRow] {
        &self.chart
    }

    /// Export with the active filter. A failed export yields the local
    /// summary instead of an error.
    pub async fn export(&mut self, format: ExportFormat, now: DateTime<Utc>) -> ExportArtifact {
        let file_name = export_file_name(&self.filter, format);
        match self.service.export_report(&self.filter, format).await {
            Ok(bytes) => {
                info!("exported {} ({} bytes)", file_name, bytes.len());
                self.notices
                    .push(Notice::success("Report exported").with_detail(format!("Format: {}", format.extension().to_uppercase())));
                ExportArtifact {
                    file_name,
                    content_type: format.content_type().to_string(),
                    bytes,
                    is_fallback: false,
                }
            }
            Err(e) => {
                warn!("export failed, writing summary instead: {}", e);
                self.notices.push(Notice::info("Using sample data").with_detail(
                    "The export endpoint failed; a summary report was produced instead",
                ));
                ExportArtifact {
                    file_name,
                    content_type: FALLBACK_CONTENT_TYPE.to_string(),
                    bytes: fallback::report_export(self.filter.report_type, now).into_bytes(),
                    is_fallback: true,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::seeded;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn default_filter_covers_the_last_week() {
        let filter = default_filter(day(2024, 3, 3));
        assert_eq!(filter.date_range.from, day(2024, 2, 25));
        assert_eq!(filter.date_range.to, day(2024, 3, 3));
        assert_eq!(filter.report_type, ReportType::Usage);
        assert!(filter.include_details);
    }

    #[test]
    fn file_name_carries_type_start_and_format() {
        let mut filter = default_filter(day(2024, 6, 8));
        filter.report_type = ReportType::Inventory;
        assert_eq!(
            export_file_name(&filter, ExportFormat::Xlsx),
            "ip-report-inventory-2024-06-01-xlsx.xlsx"
        );
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let (_, service) = seeded();
        let mut page = ReportsPage::new(service, day(2024, 6, 8));
        let err = page.set_range(day(2024, 6, 9), day(2024, 6, 1)).unwrap_err();
        assert!(err.get("dateRange").is_some());
        assert_eq!(page.filter().date_range.from, day(2024, 6, 1));
    }

    #[tokio::test]
    async fn export_returns_server_bytes() {
        let (mock, service) = seeded();
        mock.set_export(b"hostname,ip\nweb,10.0.0.1\n".to_vec());
        let mut page = ReportsPage::new(service, day(2024, 6, 8));

        let artifact = page.export(ExportFormat::Csv, fallback::anchor()).await;
        assert!(!artifact.is_fallback);
        assert_eq!(artifact.content_type, "text/csv");
        assert_eq!(artifact.file_name, "ip-report-usage-2024-06-01-csv.csv");
        assert_eq!(artifact.bytes, b"hostname,ip\nweb,10.0.0.1\n");
        assert_eq!(mock.calls(), ["POST /reports/export"]);
    }

    #[tokio::test]
    async fn failed_export_falls_back_to_summary() {
        let (mock, service) = seeded();
        mock.fail_mutations(true);
        let mut page = ReportsPage::new(service, day(2024, 6, 8));
        page.set_report_type(ReportType::Security);

        let artifact = page.export(ExportFormat::Xlsx, fallback::anchor()).await;
        assert!(artifact.is_fallback);
        assert_eq!(artifact.content_type, FALLBACK_CONTENT_TYPE);
        let text = String::from_utf8(artifact.bytes.clone()).unwrap();
        assert!(text.starts_with("Report Type: security\n"));
        assert_eq!(page.notices().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = artifact.write_to(&dir.path().join("out")).unwrap();
        assert_eq!(path.file_name().unwrap(), "ip-report-security-2024-06-01-xlsx.xlsx");
        assert_eq!(std::fs::read(path).unwrap(), artifact.bytes);
    }

    #[tokio::test]
    async fn chart_is_stable_across_loads() {
        let (_, service) = seeded();
        let mut page = ReportsPage::new(service, day(2024, 6, 8));
        let first = page.load_chart().await.to_vec();
        let second = page.load_chart().await.to_vec();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[0].name, "Office LAN A");
    }
}
