// render_sync.rs

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

use crate::plot::{CultureType, Plot, PlotId, UNKNOWN_CULTURE_LABEL};

pub const COLOR_SATURATION: u8 = 70;
pub const COLOR_LIGHTNESS: u8 = 55;

/// Feature property names written by the sync pass.
pub const PROP_ID: &str = "id";
pub const PROP_NAME: &str = "name";
pub const PROP_CULTURE: &str = "culture_type";
pub const PROP_SURFACE: &str = "surface";
pub const PROP_FILL_COLOR: &str = "fill_color";

/// Display color of a plot: a hue with fixed saturation and lightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayColor {
    hue: u16,
}

impl DisplayColor {
    pub fn from_hue(hue: u16) -> Self {
        DisplayColor { hue: hue % 360 }
    }

    /// CSS form, as stored in the `fill_color` feature property.
    pub fn to_css(&self) -> String {
        format!(
            "hsl({}, {}%, {}%)",
            self.hue, COLOR_SATURATION, COLOR_LIGHTNESS
        )
    }

    /// Parses the CSS form produced by [`DisplayColor::to_css`].
    pub fn parse_css(css: &str) -> Option<Self> {
        let inner = css.trim().strip_prefix("hsl(")?.strip_suffix(')')?;
        let hue = inner.split(',').next()?.trim().parse::<u16>().ok()?;
        Some(Self::from_hue(hue))
    }

    pub fn to_rgb(&self) -> (u8, u8, u8) {
        hsl_to_rgb(
            self.hue as f64,
            COLOR_SATURATION as f64 / 100.0,
            COLOR_LIGHTNESS as f64 / 100.0,
        )
    }
}

/// Convert HSL to 8-bit RGB.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let h_prime = (h % 360.0) / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h_prime < 1.0 {
        (c, x, 0.0)
    } else if h_prime < 2.0 {
        (x, c, 0.0)
    } else if h_prime < 3.0 {
        (0.0, c, x)
    } else if h_prime < 4.0 {
        (0.0, x, c)
    } else if h_prime < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r), to_byte(g), to_byte(b))
}

/// A surface that can display the plot layer once it is ready.
pub trait RenderSurface {
    /// Whether the surface can accept data (the map style has loaded).
    fn is_ready(&self) -> bool;
    fn set_data(&mut self, features: FeatureCollection);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    /// The surface was not ready; the layer is kept until `on_surface_ready`.
    Deferred,
}

/// Keeps the rendered plot layer in step with the plot list.
///
/// Colors are cached by plot id for the lifetime of this value, so a plot
/// keeps its color across every re-render.
pub struct PlotRenderSync {
    colors: HashMap<PlotId, DisplayColor>,
    rng: ChaCha8Rng,
    pending: Option<FeatureCollection>,
}

impl PlotRenderSync {
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// Deterministic colors, for reproducible exports and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        PlotRenderSync {
            colors: HashMap::new(),
            rng,
            pending: None,
        }
    }

    pub fn color_of(&self, id: PlotId) -> Option<DisplayColor> {
        self.colors.get(&id).copied()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Cached color for `id`, generating one the first time it is seen.
    fn assign_color(&mut self, id: PlotId) -> DisplayColor {
        let rng = &mut self.rng;
        *self
            .colors
            .entry(id)
            .or_insert_with(|| DisplayColor::from_hue(rng.gen_range(0..360)))
    }

    /// Builds the feature collection for `plots`, in list order.
    pub fn build_features(&mut self, plots: &[Plot]) -> FeatureCollection {
        let features = plots
            .iter()
            .map(|plot| {
                let color = self.assign_color(plot.id);
                plot_feature(plot, color)
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Pushes the current plot list to the surface, or keeps it for later if
    /// the surface is not ready yet.
    pub fn sync<R: RenderSurface>(&mut self, plots: &[Plot], surface: &mut R) -> SyncOutcome {
        let features = self.build_features(plots);
        if surface.is_ready() {
            self.pending = None;
            surface.set_data(features);
            SyncOutcome::Applied
        } else {
            log::debug!(
                "Render surface not ready, deferring {} plots",
                features.features.len()
            );
            self.pending = Some(features);
            SyncOutcome::Deferred
        }
    }

    /// Flushes a deferred layer. Call when the surface signals readiness.
    pub fn on_surface_ready<R: RenderSurface>(&mut self, surface: &mut R) -> SyncOutcome {
        if !surface.is_ready() {
            return SyncOutcome::Deferred;
        }
        if let Some(features) = self.pending.take() {
            surface.set_data(features);
        }
        SyncOutcome::Applied
    }
}

impl Default for PlotRenderSync {
    fn default() -> Self {
        Self::new()
    }
}

fn plot_feature(plot: &Plot, color: DisplayColor) -> Feature {
    let culture = match &plot.culture_type {
        CultureType::Unknown => UNKNOWN_CULTURE_LABEL.to_string(),
        other => other.label().to_string(),
    };
    let mut properties = JsonObject::new();
    properties.insert(PROP_ID.to_string(), JsonValue::from(plot.id.0));
    properties.insert(PROP_NAME.to_string(), JsonValue::from(plot.name.clone()));
    properties.insert(PROP_CULTURE.to_string(), JsonValue::from(culture));
    properties.insert(
        PROP_SURFACE.to_string(),
        JsonValue::from(plot.surface.max(0.0)),
    );
    properties.insert(PROP_FILL_COLOR.to_string(), JsonValue::from(color.to_css()));

    Feature {
        bbox: None,
        geometry: Some(plot.geometry.clone()),
        id: Some(geojson::feature::Id::Number(plot.id.0.into())),
        properties: Some(properties),
        foreign_members: None,
    }
}

pub fn feature_plot_id(feature: &Feature) -> Option<PlotId> {
    feature
        .property(PROP_ID)
        .and_then(JsonValue::as_u64)
        .map(PlotId)
}

pub fn feature_color(feature: &Feature) -> Option<DisplayColor> {
    feature
        .property(PROP_FILL_COLOR)
        .and_then(JsonValue::as_str)
        .and_then(DisplayColor::parse_css)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::drawing::tests::square;
    use chrono::Utc;

    /// Surface double that becomes ready on demand.
    #[derive(Default)]
    pub struct TestSurface {
        pub ready: bool,
        pub data: Option<FeatureCollection>,
        pub updates: usize,
    }

    impl RenderSurface for TestSurface {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn set_data(&mut self, features: FeatureCollection) {
            self.updates += 1;
            self.data = Some(features);
        }
    }

    pub fn plot(id: u64, culture_type: CultureType) -> Plot {
        Plot {
            id: PlotId(id),
            name: format!("Plot {}", id),
            description: String::new(),
            culture_type,
            surface: 1000.0 * id as f64,
            geometry: square(0.001 * id as f64),
            created_at: Utc::now(),
        }
    }

    fn colors(features: &FeatureCollection) -> Vec<(PlotId, DisplayColor)> {
        features
            .features
            .iter()
            .map(|f| (feature_plot_id(f).unwrap(), feature_color(f).unwrap()))
            .collect()
    }

    #[test]
    fn test_colors_stable_across_renders() {
        let mut sync = PlotRenderSync::with_seed(7);
        let mut surface = TestSurface {
            ready: true,
            ..Default::default()
        };
        let plots = vec![plot(1, CultureType::Wheat), plot(2, CultureType::Maize)];

        sync.sync(&plots, &mut surface);
        let first = colors(surface.data.as_ref().unwrap());
        sync.sync(&plots, &mut surface);
        let second = colors(surface.data.as_ref().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_plot_only_adds_its_own_color() {
        let mut sync = PlotRenderSync::with_seed(7);
        let mut plots = vec![plot(1, CultureType::Wheat), plot(2, CultureType::Maize)];
        let before = colors(&sync.build_features(&plots));

        plots.push(plot(3, CultureType::Olives));
        let after = colors(&sync.build_features(&plots));
        assert_eq!(&after[..2], &before[..]);
        assert_eq!(after[2].0, PlotId(3));
        assert_eq!(sync.color_of(PlotId(3)), Some(after[2].1));
    }

    #[test]
    fn test_features_carry_plot_properties() {
        let mut sync = PlotRenderSync::with_seed(1);
        let features = sync.build_features(&[plot(4, CultureType::Unknown)]);
        let feature = &features.features[0];
        assert_eq!(feature.property(PROP_NAME).and_then(JsonValue::as_str), Some("Plot 4"));
        assert_eq!(
            feature.property(PROP_CULTURE).and_then(JsonValue::as_str),
            Some(UNKNOWN_CULTURE_LABEL)
        );
        assert_eq!(
            feature.property(PROP_SURFACE).and_then(JsonValue::as_f64),
            Some(4000.0)
        );
        assert!(feature.geometry.is_some());
    }

    #[test]
    fn test_sync_before_ready_is_deferred_then_flushed() {
        let mut sync = PlotRenderSync::with_seed(3);
        let mut surface = TestSurface::default();
        let plots = vec![plot(1, CultureType::Wheat)];

        assert_eq!(sync.sync(&plots, &mut surface), SyncOutcome::Deferred);
        assert!(surface.data.is_none());
        assert!(sync.has_pending());
        assert_eq!(sync.on_surface_ready(&mut surface), SyncOutcome::Deferred);

        surface.ready = true;
        assert_eq!(sync.on_surface_ready(&mut surface), SyncOutcome::Applied);
        assert_eq!(surface.updates, 1);
        assert_eq!(surface.data.as_ref().unwrap().features.len(), 1);
        assert!(!sync.has_pending());
    }

    #[test]
    fn test_latest_deferred_layer_wins() {
        let mut sync = PlotRenderSync::with_seed(3);
        let mut surface = TestSurface::default();
        sync.sync(&[plot(1, CultureType::Wheat)], &mut surface);
        sync.sync(
            &[plot(1, CultureType::Wheat), plot(2, CultureType::Wheat)],
            &mut surface,
        );
        surface.ready = true;
        sync.on_surface_ready(&mut surface);
        assert_eq!(surface.updates, 1);
        assert_eq!(surface.data.unwrap().features.len(), 2);
    }

    #[test]
    fn test_css_roundtrip_and_rgb() {
        let color = DisplayColor::from_hue(120);
        assert_eq!(color.to_css(), "hsl(120, 70%, 55%)");
        assert_eq!(DisplayColor::parse_css(&color.to_css()), Some(color));
        let (r, g, b) = color.to_rgb();
        assert!(g > r && g > b);
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), (255, 0, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), (0, 0, 255));
    }
}
