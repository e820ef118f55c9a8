// export.rs

use plotters::prelude::*;
use std::error::Error;
use std::path::Path;

use crate::map_view::MapLayer;
use crate::plot::PlotId;

const EXPORT_WIDTH: u32 = 1024;
const EXPORT_HEIGHT: u32 = 768;

/// Renders the plot layer to a PNG, each plot filled with its display color.
/// Returns the number of plots drawn.
pub fn export_png(
    layer: &MapLayer,
    selected: Option<PlotId>,
    path: &Path,
) -> Result<usize, Box<dyn Error>> {
    let mut x_range = -180.0f64..180.0f64;
    let mut y_range = -90.0f64..90.0f64;

    if let Some([min_lon, min_lat, max_lon, max_lat]) = layer.bbox() {
        let padding_percentage = 0.1; // 10% padding
        let epsilon = 0.0001;

        let lon_range = (max_lon - min_lon).max(epsilon);
        let lat_range = (max_lat - min_lat).max(epsilon);
        let lon_padding = lon_range * padding_percentage;
        let lat_padding = lat_range * padding_percentage;

        x_range = (min_lon - lon_padding).max(-180.0)..(max_lon + lon_padding).min(180.0);
        y_range = (min_lat - lat_padding).max(-90.0)..(max_lat + lat_padding).min(90.0);
    } else {
        log::warn!("Exporting an empty plot layer, using the global view");
    }

    let root = BitMapBackend::new(path, (EXPORT_WIDTH, EXPORT_HEIGHT)).into_drawing_area();
    root.fill(&RGBColor(34, 49, 29))?; // Dark field green background

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption("Plots", ("sans-serif", 40).into_font().color(&WHITE))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .axis_style(&WHITE)
        .label_style(("sans-serif", 12).into_font().color(&WHITE))
        .light_line_style(RGBColor(60, 80, 55))
        .draw()?;

    for plot in layer.plots() {
        let (r, g, b) = plot.color.to_rgb();
        let fill = RGBColor(r, g, b);
        let outline = if Some(plot.id) == selected {
            RGBColor(255, 255, 0)
        } else {
            WHITE
        };
        for ring in &plot.rings {
            chart.draw_series(std::iter::once(Polygon::new(ring.clone(), fill.mix(0.7))))?;
            chart.draw_series(LineSeries::new(ring.iter().copied(), outline.stroke_width(2)))?;
        }
    }

    root.present()?;
    log::info!("Exported {} plots to {}", layer.plots().len(), path.display());
    Ok(layer.plots().len())
}
