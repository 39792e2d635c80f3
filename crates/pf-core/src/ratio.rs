//! Ratio tables built from unprefirable/prefirable pairs.
//!
//! The ratio is a per-cell binomial division of the unprefirable table by
//! the prefirable one. The normalised ratio divides each algorithm row by
//! its value at BX 0, so a row whose timing does not depend on the prefire
//! classification reads 1.0 everywhere.

use pf_common::{Error, Result};
use pf_config::monitor::ClientConfig;
use pf_math::binomial::binomial_ratio_weighted;
use serde::Serialize;
use tracing::{debug, info};

use crate::histogram::{hist_path, Axis, Histogram2D, HistogramStore};
use crate::logging::event_names;

/// A ratio and its BX-0 normalised counterpart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioTables {
    pub ratio: Histogram2D,
    pub normalized: Histogram2D,
}

/// Build fresh ratio tables shaped like `num`.
pub fn build_ratio(num: &Histogram2D, den: &Histogram2D) -> Result<RatioTables> {
    let mut ratio = shaped_like(num, "ratio", "");
    let mut normalized = shaped_like(num, "relative_ratio", "");
    fill_ratio(num, den, &mut ratio, &mut normalized)?;
    Ok(RatioTables { ratio, normalized })
}

/// Recompute `ratio` and `normalized` in place from `num` / `den`.
///
/// Both targets are reset first, so calling this repeatedly with the same
/// inputs gives the same tables. Cells with an empty denominator stay zero,
/// as do rows whose BX-0 ratio is zero.
pub fn fill_ratio(
    num: &Histogram2D,
    den: &Histogram2D,
    ratio: &mut Histogram2D,
    normalized: &mut Histogram2D,
) -> Result<()> {
    if !num.same_shape(den) {
        return Err(Error::ShapeMismatch(format!(
            "numerator '{}' and denominator '{}' differ in binning",
            num.name(),
            den.name()
        )));
    }
    for target in [&*ratio, &*normalized] {
        if !num.same_shape(target) {
            return Err(Error::ShapeMismatch(format!(
                "ratio table '{}' does not match numerator '{}'",
                target.name(),
                num.name()
            )));
        }
    }

    ratio.reset();
    normalized.reset();
    copy_labels(num, ratio)?;
    copy_labels(num, normalized)?;

    let (nx, ny) = (num.nbins_x(), num.nbins_y());
    for iy in 1..=ny {
        for ix in 1..=nx {
            let cell = binomial_ratio_weighted(
                num.bin_content(ix, iy),
                num.bin_sumw2(ix, iy),
                den.bin_content(ix, iy),
                den.bin_sumw2(ix, iy),
            );
            if let Some(r) = cell {
                ratio.set_bin_content(ix, iy, r.value)?;
                ratio.set_bin_error(ix, iy, r.error)?;
            }
        }
    }
    ratio.set_entries(num.entries());

    let bx0 = ratio.x_axis().find_bin(0.0);
    for iy in 1..=ny {
        let norm = ratio.bin_content(bx0, iy);
        for ix in 1..=nx {
            let value = if norm != 0.0 {
                ratio.bin_content(ix, iy) / norm
            } else {
                0.0
            };
            normalized.set_bin_content(ix, iy, value)?;
        }
    }
    normalized.set_entries(num.entries());

    Ok(())
}

fn shaped_like(num: &Histogram2D, name: &str, title: &str) -> Histogram2D {
    let x = num.x_axis();
    let y = num.y_axis();
    Histogram2D::new(
        name,
        title,
        Axis::new(x.bins(), x.min(), x.max()),
        Axis::new(y.bins(), y.min(), y.max()),
    )
}

fn copy_labels(from: &Histogram2D, to: &mut Histogram2D) -> Result<()> {
    if from.x_axis().is_alphanumeric() {
        for bin in 1..=from.nbins_x() {
            let label = from.x_axis().bin_label(bin).to_string();
            to.x_axis_mut().set_bin_label(bin, label)?;
        }
    }
    if from.y_axis().is_alphanumeric() {
        for bin in 1..=from.nbins_y() {
            let label = from.y_axis().bin_label(bin).to_string();
            to.y_axis_mut().set_bin_label(bin, label)?;
        }
    }
    Ok(())
}

/// Result of one harvesting pass over a ratio pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HarvestOutcome {
    Computed,
    MissingInput { path: String },
}

/// Ratio and normalised ratio of one numerator/denominator pair in the
/// store.
#[derive(Debug, Clone)]
pub struct DoubleRatio {
    monitor_dir: String,
    input_num: String,
    input_den: String,
    ratio_name: String,
    ratio_title: String,
    normalized_name: String,
    normalized_title: String,
    booked: bool,
}

impl DoubleRatio {
    pub fn new(
        monitor_dir: &str,
        input_num: String,
        input_den: String,
        name: &str,
        title: &str,
    ) -> Self {
        DoubleRatio {
            monitor_dir: monitor_dir.to_string(),
            input_num,
            input_den,
            ratio_name: format!("ratio_{}", name),
            ratio_title: format!(
                "Ratio of L1A in Unprefirable Events to Prefirable Events for {}",
                title
            ),
            normalized_name: format!("relative_ratio_{}", name),
            normalized_title: format!(
                "Fraction of L1A for Unprefirable Events compared to Prefirable Events for {}",
                title
            ),
            booked: false,
        }
    }

    pub fn ratio_path(&self) -> String {
        hist_path(&self.monitor_dir, &self.ratio_name)
    }

    pub fn normalized_path(&self) -> String {
        hist_path(&self.monitor_dir, &self.normalized_name)
    }

    pub fn is_booked(&self) -> bool {
        self.booked
    }

    /// Book on the first call that finds the numerator; later calls refill
    /// the same tables.
    pub fn run(&mut self, store: &mut HistogramStore) -> Result<HarvestOutcome> {
        let num = match store.get_2d(&self.input_num) {
            Ok(h) => h.clone(),
            Err(Error::HistogramNotFound { path }) => return Ok(self.missing(path)),
            Err(e) => return Err(e),
        };

        if !self.booked {
            self.book(store, &num)?;
            self.booked = true;
        }

        // Tables are cleared on every pass, even when the denominator is gone.
        let mut ratio = store.get_2d(&self.ratio_path())?.clone();
        let mut normalized = store.get_2d(&self.normalized_path())?.clone();
        ratio.reset();
        normalized.reset();

        let den = match store.get_2d(&self.input_den) {
            Ok(h) => h.clone(),
            Err(Error::HistogramNotFound { path }) => {
                store.publish(&self.monitor_dir, ratio);
                store.publish(&self.monitor_dir, normalized);
                return Ok(self.missing(path));
            }
            Err(e) => return Err(e),
        };

        fill_ratio(&num, &den, &mut ratio, &mut normalized)?;
        store.publish(&self.monitor_dir, ratio);
        store.publish(&self.monitor_dir, normalized);

        debug!(
            target: event_names::HARVEST_DONE,
            ratio = %self.ratio_path(),
            "ratio tables refreshed"
        );
        Ok(HarvestOutcome::Computed)
    }

    fn book(&self, store: &mut HistogramStore, num: &Histogram2D) -> Result<()> {
        let x = num.x_axis();
        let y = num.y_axis();
        let tables = [
            (
                &self.ratio_name,
                &self.ratio_title,
                "Ratio of L1A, Unprefirable / Prefirable events",
            ),
            (
                &self.normalized_name,
                &self.normalized_title,
                "Ratio of L1A, (Unprefirable / Prefirable) normalised to BX = 0",
            ),
        ];
        for (name, title, z_title) in tables {
            let hist = store.book_2d(
                &self.monitor_dir,
                name,
                title,
                Axis::new(x.bins(), x.min(), x.max()),
                Axis::new(y.bins(), y.min(), y.max()),
            )?;
            hist.set_efficiency_flag();
            hist.set_axis_title(1, "Relative Bunch Crossing");
            hist.set_axis_title(2, "Algorithm");
            hist.set_axis_title(3, z_title);
        }
        Ok(())
    }

    fn missing(&self, path: String) -> HarvestOutcome {
        info!(
            target: event_names::HARVEST_INPUT_MISSING,
            ratio = %self.ratio_name,
            path = %path,
            "ratio input not available"
        );
        HarvestOutcome::MissingInput { path }
    }
}

/// Harvester for the algorithm timing tables.
#[derive(Debug, Clone)]
pub struct PrefiringClient {
    ratios: [DoubleRatio; 3],
}

impl PrefiringClient {
    pub fn new(config: &ClientConfig) -> Self {
        let pair = |hist: &str, title: &str| {
            DoubleRatio::new(
                &config.monitor_dir,
                hist_path(
                    &config.input_dir,
                    &format!("{}{}", hist, config.unprefirable_suffix),
                ),
                hist_path(
                    &config.input_dir,
                    &format!("{}{}", hist, config.prefirable_suffix),
                ),
                hist,
                title,
            )
        };
        PrefiringClient {
            ratios: [
                pair(&config.all_algs_hist, "All Algorithms"),
                pair(&config.prescale_algs_hist, "Algorithms with Prescaling"),
                pair(&config.unprescale_algs_hist, "Algorithms without Prescaling"),
            ],
        }
    }

    pub fn ratios(&self) -> &[DoubleRatio] {
        &self.ratios
    }

    /// Refresh every ratio pair; returns one outcome per pair.
    pub fn run(&mut self, store: &mut HistogramStore) -> Result<Vec<HarvestOutcome>> {
        self.ratios.iter_mut().map(|r| r.run(store)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, cells: &[(f64, f64, f64)]) -> Histogram2D {
        let mut h = Histogram2D::new(
            name,
            "",
            Axis::new(5, -2.5, 2.5),
            Axis::new(2, -0.5, 1.5),
        );
        for &(x, y, w) in cells {
            for _ in 0..w as usize {
                h.fill(x, y);
            }
        }
        h
    }

    #[test]
    fn divides_cell_by_cell() {
        let num = table("n", &[(0.0, 0.0, 5.0), (-1.0, 0.0, 0.0), (1.0, 1.0, 5.0)]);
        let den = table("d", &[(0.0, 0.0, 10.0), (-1.0, 0.0, 10.0)]);
        let tables = build_ratio(&num, &den).unwrap();
        assert_eq!(tables.ratio.content_at(0.0, 0.0), 0.5);
        assert_eq!(tables.ratio.content_at(-1.0, 0.0), 0.0);
        // Empty denominator leaves the cell at zero.
        assert_eq!(tables.ratio.content_at(1.0, 1.0), 0.0);
        let (ix, iy) = tables.ratio.find_bin(0.0, 0.0);
        assert!((tables.ratio.bin_error(ix, iy) - (0.25f64 / 10.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn normalizes_rows_to_bx0() {
        let num = table("n", &[(0.0, 0.0, 4.0), (1.0, 0.0, 2.0), (1.0, 1.0, 3.0)]);
        let den = table("d", &[(0.0, 0.0, 8.0), (1.0, 0.0, 8.0), (1.0, 1.0, 3.0)]);
        let tables = build_ratio(&num, &den).unwrap();
        assert_eq!(tables.normalized.content_at(0.0, 0.0), 1.0);
        assert_eq!(tables.normalized.content_at(1.0, 0.0), 0.5);
        // Row 1 has no BX-0 ratio.
        assert_eq!(tables.normalized.content_at(1.0, 1.0), 0.0);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let num = table("n", &[]);
        let den = Histogram2D::new("d", "", Axis::new(3, -1.5, 1.5), Axis::new(2, -0.5, 1.5));
        assert!(matches!(build_ratio(&num, &den), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn labels_follow_numerator() {
        let mut num = table("n", &[]);
        num.y_axis_mut().set_bin_label(1, "L1_A (3)").unwrap();
        let den = table("d", &[]);
        let tables = build_ratio(&num, &den).unwrap();
        assert_eq!(tables.ratio.y_axis().bin_label(1), "L1_A (3)");
        assert_eq!(tables.normalized.y_axis().bin_label(1), "L1_A (3)");
        assert!(!tables.ratio.x_axis().is_alphanumeric());
    }

    #[test]
    fn client_books_once_and_skips_missing_inputs() {
        let config = ClientConfig::default();
        let mut client = PrefiringClient::new(&config);
        let mut store = HistogramStore::new();

        let outcomes = client.run(&mut store).unwrap();
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, HarvestOutcome::MissingInput { .. })));
        assert!(store.is_empty());

        store.publish(
            &config.input_dir,
            table("all_algos_vs_bx_unpref", &[(0.0, 0.0, 2.0)]),
        );
        let outcomes = client.run(&mut store).unwrap();
        assert_eq!(
            outcomes[0],
            HarvestOutcome::MissingInput {
                path: "L1T/L1TStage2uGT/timing_aux/all_algos_vs_bx_pref".to_string()
            }
        );
        assert!(client.ratios()[0].is_booked());
        let ratio = store
            .get_2d("L1T/L1TStage2uGT/timing_aux/Ratios/ratio_all_algos_vs_bx")
            .unwrap();
        assert!(ratio.is_efficiency());
        assert_eq!(ratio.z_title(), "Ratio of L1A, Unprefirable / Prefirable events");
        assert_eq!(
            ratio.title(),
            "Ratio of L1A in Unprefirable Events to Prefirable Events for All Algorithms"
        );

        store.publish(
            &config.input_dir,
            table("all_algos_vs_bx_pref", &[(0.0, 0.0, 4.0)]),
        );
        assert_eq!(client.run(&mut store).unwrap()[0], HarvestOutcome::Computed);
        let ratio = store
            .get_2d("L1T/L1TStage2uGT/timing_aux/Ratios/ratio_all_algos_vs_bx")
            .unwrap();
        assert_eq!(ratio.content_at(0.0, 0.0), 0.5);
        assert_eq!(ratio.x_axis().title(), "Relative Bunch Crossing");
    }

    #[test]
    fn missing_denominator_clears_previous_ratio() {
        let mut pair = DoubleRatio::new(
            "out",
            "in/algos_unpref".to_string(),
            "in/algos_pref".to_string(),
            "algos",
            "Algos",
        );
        let num = table("algos_unpref", &[(0.0, 0.0, 2.0)]);
        let den = table("algos_pref", &[(0.0, 0.0, 4.0)]);

        let mut store = HistogramStore::new();
        store.publish("in", num.clone());
        store.publish("in", den);
        assert_eq!(pair.run(&mut store).unwrap(), HarvestOutcome::Computed);
        assert_eq!(store.get_2d(&pair.ratio_path()).unwrap().content_at(0.0, 0.0), 0.5);

        // Same booked tables, denominator gone.
        let mut next = HistogramStore::new();
        next.publish("in", num);
        next.publish("out", store.get_2d(&pair.ratio_path()).unwrap().clone());
        next.publish("out", store.get_2d(&pair.normalized_path()).unwrap().clone());
        assert!(matches!(
            pair.run(&mut next).unwrap(),
            HarvestOutcome::MissingInput { .. }
        ));

        let ratio = next.get_2d(&pair.ratio_path()).unwrap();
        assert_eq!(ratio.content_at(0.0, 0.0), 0.0);
        assert_eq!(ratio.entries(), 0);
        assert!(ratio.is_efficiency());
        assert_eq!(next.get_2d(&pair.normalized_path()).unwrap().integral(), 0.0);
    }
}
