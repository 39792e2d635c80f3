//! Fixed-binning 1D/2D histograms and the store they are published to.
//!
//! Bin numbering follows the usual convention: bin 0 is the underflow,
//! bins `1..=n` are the visible range and bin `n + 1` is the overflow.
//! Each cell keeps its content and the sum of squared weights.

use std::collections::BTreeMap;

use pf_common::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One histogram axis with uniform bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Axis {
    bins: usize,
    min: f64,
    max: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
    /// Labels for the visible bins; empty when the axis is numeric.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
}

impl Axis {
    pub fn new(bins: usize, min: f64, max: f64) -> Self {
        Axis {
            bins,
            min,
            max,
            title: String::new(),
            labels: Vec::new(),
        }
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn width(&self) -> f64 {
        if self.bins == 0 {
            return 0.0;
        }
        (self.max - self.min) / self.bins as f64
    }

    /// Bin holding `x`, including under/overflow.
    pub fn find_bin(&self, x: f64) -> usize {
        if x.is_nan() || x < self.min {
            return 0;
        }
        if x >= self.max || self.bins == 0 {
            return self.bins + 1;
        }
        let bin = ((x - self.min) / self.width()).floor() as usize + 1;
        bin.min(self.bins)
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        self.min + (bin as f64 - 0.5) * self.width()
    }

    /// Move `x` into the visible range: values below the axis land in the
    /// first bin, values at or above the upper edge in the last.
    pub fn clamp_within(&self, x: f64) -> f64 {
        if x < self.min {
            self.min
        } else if x >= self.max {
            self.max - 0.5 * self.width()
        } else {
            x
        }
    }

    pub fn set_bin_label(&mut self, bin: usize, label: impl Into<String>) -> Result<()> {
        if bin == 0 || bin > self.bins {
            return Err(Error::BinOutOfRange {
                bin,
                bins: self.bins,
            });
        }
        if self.labels.len() < self.bins {
            self.labels.resize(self.bins, String::new());
        }
        self.labels[bin - 1] = label.into();
        Ok(())
    }

    /// Label of a visible bin; empty when unlabelled.
    pub fn bin_label(&self, bin: usize) -> &str {
        bin.checked_sub(1)
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// The axis carries at least one bin label.
    pub fn is_alphanumeric(&self) -> bool {
        self.labels.iter().any(|l| !l.is_empty())
    }

    /// Same number of bins over the same range.
    pub fn same_binning(&self, other: &Axis) -> bool {
        self.bins == other.bins && self.min == other.min && self.max == other.max
    }

    fn cells(&self) -> usize {
        self.bins + 2
    }
}

/// Split a `"title;x title;y title;z title"` string.
fn split_title(full: &str) -> (String, Vec<String>) {
    let mut parts = full.split(';');
    let title = parts.next().unwrap_or("").trim().to_string();
    let axes = parts.map(|p| p.trim().to_string()).collect();
    (title, axes)
}

/// A one-dimensional histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Histogram1D {
    name: String,
    title: String,
    x: Axis,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    y_title: String,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    entries: u64,
}

impl Histogram1D {
    /// Create an empty histogram; axis titles may be given ROOT-style in
    /// `title` after semicolons.
    pub fn new(name: impl Into<String>, title: &str, mut x: Axis) -> Self {
        let (title, axes) = split_title(title);
        if let Some(t) = axes.first().filter(|t| !t.is_empty()) {
            x.set_title(t.clone());
        }
        let cells = x.cells();
        Histogram1D {
            name: name.into(),
            title,
            x,
            y_title: axes.get(1).cloned().unwrap_or_default(),
            contents: vec![0.0; cells],
            sumw2: vec![0.0; cells],
            entries: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_title(&self) -> &str {
        &self.y_title
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    pub fn fill(&mut self, x: f64) {
        self.fill_weighted(x, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, weight: f64) {
        let bin = self.x.find_bin(x);
        self.contents[bin] += weight;
        self.sumw2[bin] += weight * weight;
        self.entries += 1;
    }

    /// Fill with `x` clamped into the visible range.
    pub fn fill_within_limits(&mut self, x: f64) {
        let x = self.x.clamp_within(x);
        self.fill(x);
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents.get(bin).copied().unwrap_or(0.0)
    }

    pub fn bin_error(&self, bin: usize) -> f64 {
        self.sumw2.get(bin).copied().unwrap_or(0.0).sqrt()
    }

    /// Sum of the visible bins.
    pub fn integral(&self) -> f64 {
        self.contents[1..=self.x.bins()].iter().sum()
    }

    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.sumw2.iter_mut().for_each(|c| *c = 0.0);
        self.entries = 0;
    }
}

/// A two-dimensional histogram.
///
/// Cells are stored row-major over y: `index = ix + (nx + 2) * iy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Histogram2D {
    name: String,
    title: String,
    x: Axis,
    y: Axis,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    z_title: String,
    contents: Vec<f64>,
    sumw2: Vec<f64>,
    entries: u64,
    #[serde(default)]
    efficiency: bool,
}

impl Histogram2D {
    pub fn new(name: impl Into<String>, title: &str, mut x: Axis, mut y: Axis) -> Self {
        let (title, axes) = split_title(title);
        if let Some(t) = axes.first().filter(|t| !t.is_empty()) {
            x.set_title(t.clone());
        }
        if let Some(t) = axes.get(1).filter(|t| !t.is_empty()) {
            y.set_title(t.clone());
        }
        let cells = x.cells() * y.cells();
        Histogram2D {
            name: name.into(),
            title,
            x,
            y,
            z_title: axes.get(2).cloned().unwrap_or_default(),
            contents: vec![0.0; cells],
            sumw2: vec![0.0; cells],
            entries: 0,
            efficiency: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    pub fn x_axis_mut(&mut self) -> &mut Axis {
        &mut self.x
    }

    pub fn y_axis_mut(&mut self) -> &mut Axis {
        &mut self.y
    }

    pub fn z_title(&self) -> &str {
        &self.z_title
    }

    /// Set the title of axis 1 (x), 2 (y) or 3 (z).
    pub fn set_axis_title(&mut self, axis: u8, title: impl Into<String>) {
        match axis {
            1 => self.x.set_title(title),
            2 => self.y.set_title(title),
            _ => self.z_title = title.into(),
        }
    }

    pub fn nbins_x(&self) -> usize {
        self.x.bins()
    }

    pub fn nbins_y(&self) -> usize {
        self.y.bins()
    }

    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Mark the contents as ratios rather than counts.
    pub fn set_efficiency_flag(&mut self) {
        self.efficiency = true;
    }

    pub fn is_efficiency(&self) -> bool {
        self.efficiency
    }

    pub fn find_bin(&self, x: f64, y: f64) -> (usize, usize) {
        (self.x.find_bin(x), self.y.find_bin(y))
    }

    fn index(&self, ix: usize, iy: usize) -> Option<usize> {
        (ix < self.x.cells() && iy < self.y.cells()).then(|| ix + self.x.cells() * iy)
    }

    pub fn fill(&mut self, x: f64, y: f64) {
        self.fill_weighted(x, y, 1.0);
    }

    pub fn fill_weighted(&mut self, x: f64, y: f64, weight: f64) {
        let (ix, iy) = self.find_bin(x, y);
        if let Some(i) = self.index(ix, iy) {
            self.contents[i] += weight;
            self.sumw2[i] += weight * weight;
        }
        self.entries += 1;
    }

    /// Fill with both coordinates clamped into the visible range.
    pub fn fill_within_limits(&mut self, x: f64, y: f64) {
        let x = self.x.clamp_within(x);
        let y = self.y.clamp_within(y);
        self.fill(x, y);
    }

    pub fn bin_content(&self, ix: usize, iy: usize) -> f64 {
        self.index(ix, iy).map(|i| self.contents[i]).unwrap_or(0.0)
    }

    pub fn bin_error(&self, ix: usize, iy: usize) -> f64 {
        self.index(ix, iy)
            .map(|i| self.sumw2[i].sqrt())
            .unwrap_or(0.0)
    }

    pub fn bin_sumw2(&self, ix: usize, iy: usize) -> f64 {
        self.index(ix, iy).map(|i| self.sumw2[i]).unwrap_or(0.0)
    }

    /// Content at the bin containing `(x, y)`.
    pub fn content_at(&self, x: f64, y: f64) -> f64 {
        let (ix, iy) = self.find_bin(x, y);
        self.bin_content(ix, iy)
    }

    pub fn set_bin_content(&mut self, ix: usize, iy: usize, value: f64) -> Result<()> {
        let i = self.checked_index(ix, iy)?;
        self.contents[i] = value;
        Ok(())
    }

    pub fn set_bin_error(&mut self, ix: usize, iy: usize, error: f64) -> Result<()> {
        let i = self.checked_index(ix, iy)?;
        self.sumw2[i] = error * error;
        Ok(())
    }

    fn checked_index(&self, ix: usize, iy: usize) -> Result<usize> {
        if ix >= self.x.cells() {
            return Err(Error::BinOutOfRange {
                bin: ix,
                bins: self.x.bins(),
            });
        }
        if iy >= self.y.cells() {
            return Err(Error::BinOutOfRange {
                bin: iy,
                bins: self.y.bins(),
            });
        }
        Ok(ix + self.x.cells() * iy)
    }

    /// Sum of the visible cells.
    pub fn integral(&self) -> f64 {
        let mut sum = 0.0;
        for iy in 1..=self.nbins_y() {
            for ix in 1..=self.nbins_x() {
                sum += self.bin_content(ix, iy);
            }
        }
        sum
    }

    /// Same binning on both axes.
    pub fn same_shape(&self, other: &Histogram2D) -> bool {
        self.x.same_binning(&other.x) && self.y.same_binning(&other.y)
    }

    /// Zero every cell and the entry count; labels and titles stay.
    pub fn reset(&mut self) {
        self.contents.iter_mut().for_each(|c| *c = 0.0);
        self.sumw2.iter_mut().for_each(|c| *c = 0.0);
        self.entries = 0;
    }

    pub(crate) fn set_entries(&mut self, entries: u64) {
        self.entries = entries;
    }
}

/// A histogram of either dimension, as kept in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "dimension")]
pub enum StoredHistogram {
    #[serde(rename = "1d")]
    H1(Histogram1D),
    #[serde(rename = "2d")]
    H2(Histogram2D),
}

impl StoredHistogram {
    pub fn name(&self) -> &str {
        match self {
            StoredHistogram::H1(h) => h.name(),
            StoredHistogram::H2(h) => h.name(),
        }
    }

    pub fn entries(&self) -> u64 {
        match self {
            StoredHistogram::H1(h) => h.entries(),
            StoredHistogram::H2(h) => h.entries(),
        }
    }

    fn dimension(&self) -> &'static str {
        match self {
            StoredHistogram::H1(_) => "1d",
            StoredHistogram::H2(_) => "2d",
        }
    }
}

impl From<Histogram1D> for StoredHistogram {
    fn from(h: Histogram1D) -> Self {
        StoredHistogram::H1(h)
    }
}

impl From<Histogram2D> for StoredHistogram {
    fn from(h: Histogram2D) -> Self {
        StoredHistogram::H2(h)
    }
}

/// Join a folder and a histogram name into a store path.
pub fn hist_path(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Histograms keyed by `folder/name`.
///
/// Booking is create-once: booking an existing path returns the histogram
/// already there.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistogramStore {
    histograms: BTreeMap<String, StoredHistogram>,
}

impl HistogramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book_1d(
        &mut self,
        folder: &str,
        name: &str,
        title: &str,
        x: Axis,
    ) -> Result<&mut Histogram1D> {
        let path = hist_path(folder, name);
        let entry = self
            .histograms
            .entry(path.clone())
            .or_insert_with(|| Histogram1D::new(name, title, x).into());
        match entry {
            StoredHistogram::H1(h) => Ok(h),
            other => Err(dimension_error(&path, "1d", other)),
        }
    }

    pub fn book_2d(
        &mut self,
        folder: &str,
        name: &str,
        title: &str,
        x: Axis,
        y: Axis,
    ) -> Result<&mut Histogram2D> {
        let path = hist_path(folder, name);
        let entry = self
            .histograms
            .entry(path.clone())
            .or_insert_with(|| Histogram2D::new(name, title, x, y).into());
        match entry {
            StoredHistogram::H2(h) => Ok(h),
            other => Err(dimension_error(&path, "2d", other)),
        }
    }

    /// Store a snapshot under `folder/<name>`, replacing any previous one.
    pub fn publish(&mut self, folder: &str, histogram: impl Into<StoredHistogram>) {
        let histogram = histogram.into();
        let path = hist_path(folder, histogram.name());
        self.histograms.insert(path, histogram);
    }

    pub fn get(&self, path: &str) -> Option<&StoredHistogram> {
        self.histograms.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.histograms.contains_key(path)
    }

    pub fn get_1d(&self, path: &str) -> Result<&Histogram1D> {
        match self.lookup(path)? {
            StoredHistogram::H1(h) => Ok(h),
            other => Err(dimension_error(path, "1d", other)),
        }
    }

    pub fn get_2d(&self, path: &str) -> Result<&Histogram2D> {
        match self.lookup(path)? {
            StoredHistogram::H2(h) => Ok(h),
            other => Err(dimension_error(path, "2d", other)),
        }
    }

    fn lookup(&self, path: &str) -> Result<&StoredHistogram> {
        self.histograms
            .get(path)
            .ok_or_else(|| Error::HistogramNotFound {
                path: path.to_string(),
            })
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.histograms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StoredHistogram)> {
        self.histograms.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }
}

fn dimension_error(path: &str, expected: &str, actual: &StoredHistogram) -> Error {
    Error::ShapeMismatch(format!(
        "'{}' is {}, expected {}",
        path,
        actual.dimension(),
        expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_bin_covers_under_and_overflow() {
        let axis = Axis::new(5, -2.5, 2.5);
        assert_eq!(axis.find_bin(-3.0), 0);
        assert_eq!(axis.find_bin(-2.5), 1);
        assert_eq!(axis.find_bin(-2.0), 1);
        assert_eq!(axis.find_bin(0.0), 3);
        assert_eq!(axis.find_bin(2.49), 5);
        assert_eq!(axis.find_bin(2.5), 6);
        assert_eq!(axis.find_bin(f64::NAN), 0);
    }

    #[test]
    fn integer_offsets_land_in_centered_bins() {
        let axis = Axis::new(5, -2.5, 2.5);
        for (bx, bin) in (-2..=2).zip(1..=5) {
            assert_eq!(axis.find_bin(f64::from(bx)), bin);
            assert_eq!(axis.bin_center(bin), f64::from(bx));
        }
    }

    #[test]
    fn clamp_within_keeps_edges_visible() {
        let axis = Axis::new(35, 0.0, 700.0);
        assert_eq!(axis.find_bin(axis.clamp_within(1e6)), 35);
        assert_eq!(axis.find_bin(axis.clamp_within(-5.0)), 1);
        assert_eq!(axis.clamp_within(123.0), 123.0);
    }

    #[test]
    fn labels_are_one_based() {
        let mut axis = Axis::new(3, -0.5, 2.5);
        assert!(!axis.is_alphanumeric());
        axis.set_bin_label(2, "L1_ZeroBias (0)").unwrap();
        assert!(axis.is_alphanumeric());
        assert_eq!(axis.bin_label(2), "L1_ZeroBias (0)");
        assert_eq!(axis.bin_label(1), "");
        assert!(axis.set_bin_label(0, "x").is_err());
        assert!(axis.set_bin_label(4, "x").is_err());
    }

    #[test]
    fn semicolon_title_sets_axis_titles() {
        let h = Histogram2D::new(
            "h",
            "Timing;Bunch Crossing;Algorithm",
            Axis::new(5, -2.5, 2.5),
            Axis::new(2, -0.5, 1.5),
        );
        assert_eq!(h.title(), "Timing");
        assert_eq!(h.x_axis().title(), "Bunch Crossing");
        assert_eq!(h.y_axis().title(), "Algorithm");
    }

    #[test]
    fn fill_2d_tracks_sumw2() {
        let mut h = Histogram2D::new("h", "", Axis::new(5, -2.5, 2.5), Axis::new(4, -0.5, 3.5));
        h.fill(0.0, 2.0);
        h.fill(0.0, 2.0);
        h.fill_weighted(1.0, 0.0, 2.0);
        assert_eq!(h.bin_content(3, 3), 2.0);
        assert_eq!(h.bin_error(3, 3), 2f64.sqrt());
        assert_eq!(h.bin_content(4, 1), 2.0);
        assert_eq!(h.bin_sumw2(4, 1), 4.0);
        assert_eq!(h.entries(), 3);
        assert_eq!(h.integral(), 4.0);
    }

    #[test]
    fn out_of_range_fill_goes_to_overflow() {
        let mut h = Histogram2D::new("h", "", Axis::new(5, -2.5, 2.5), Axis::new(2, 0.0, 2.0));
        h.fill(7.0, 0.5);
        assert_eq!(h.bin_content(6, 1), 1.0);
        assert_eq!(h.integral(), 0.0);

        h.fill_within_limits(7.0, 0.5);
        assert_eq!(h.bin_content(5, 1), 1.0);
    }

    #[test]
    fn reset_keeps_labels() {
        let mut h = Histogram2D::new("h", "", Axis::new(1, 0.0, 1.0), Axis::new(1, 0.0, 1.0));
        h.y_axis_mut().set_bin_label(1, "a").unwrap();
        h.fill(0.5, 0.5);
        h.reset();
        assert_eq!(h.integral(), 0.0);
        assert_eq!(h.entries(), 0);
        assert_eq!(h.y_axis().bin_label(1), "a");
    }

    #[test]
    fn store_books_once() {
        let mut store = HistogramStore::new();
        store
            .book_1d("L1T/Timing", "Prefirable", "t", Axis::new(2, -0.5, 1.5))
            .unwrap()
            .fill(1.0);
        let again = store
            .book_1d("L1T/Timing/", "Prefirable", "other", Axis::new(9, 0.0, 1.0))
            .unwrap();
        assert_eq!(again.entries(), 1);
        assert_eq!(again.x_axis().bins(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains("L1T/Timing/Prefirable"));
    }

    #[test]
    fn store_rejects_wrong_dimension() {
        let mut store = HistogramStore::new();
        store
            .book_1d("f", "h", "", Axis::new(2, 0.0, 1.0))
            .unwrap();
        let err = store
            .book_2d("f", "h", "", Axis::new(2, 0.0, 1.0), Axis::new(2, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        assert!(matches!(store.get_2d("f/h"), Err(Error::ShapeMismatch(_))));
        assert!(matches!(
            store.get_1d("f/missing"),
            Err(Error::HistogramNotFound { .. })
        ));
    }

    #[test]
    fn publish_replaces_snapshot() {
        let mut store = HistogramStore::new();
        let mut h = Histogram1D::new("n", "", Axis::new(2, 0.0, 2.0));
        store.publish("dir", h.clone());
        h.fill(0.5);
        store.publish("dir", h);
        assert_eq!(store.get_1d("dir/n").unwrap().entries(), 1);
    }

    #[test]
    fn store_serializes_with_dimension_tag() {
        let mut store = HistogramStore::new();
        store.book_1d("", "a", "", Axis::new(1, 0.0, 1.0)).unwrap();
        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["histograms"]["a"]["dimension"], "1d");
        let back: HistogramStore = serde_json::from_value(json).unwrap();
        assert_eq!(back, store);
    }
}
