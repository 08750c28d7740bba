//! Multi-axis chart model and its SVG rendering

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::sample::SensorSample;

/// Rotation applied to x-axis tick labels, in degrees
pub const X_TICK_ANGLE: i32 = -45;

/// Identifies one of the three independently scaled y-axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisId {
    Temperature,
    Humidity,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisSide {
    Left,
    Right,
}

/// A y-axis with a fixed domain. Values outside it are clipped at render time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub id: AxisId,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub side: AxisSide,
}

impl Axis {
    /// Position of `value` within the domain, 0.0 at `min` and 1.0 at `max`
    pub fn fraction(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// One line series bound to a y-axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub axis: AxisId,
    pub name: String,
    pub color: String,
    pub values: Vec<Option<f64>>,
}

/// Chart projection of a sample sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartModel {
    pub categories: Vec<String>,
    pub x_tick_angle: i32,
    pub axes: Vec<Axis>,
    pub series: Vec<Series>,
}

impl ChartModel {
    pub fn from_samples(samples: &[SensorSample]) -> Self {
        let categories = samples.iter().map(|s| s.timestamp.clone()).collect();

        let axes = vec![
            Axis {
                id: AxisId::Temperature,
                label: "Temperature (°C)".to_string(),
                min: 20.0,
                max: 30.0,
                side: AxisSide::Left,
            },
            Axis {
                id: AxisId::Humidity,
                label: "Humidity (%)".to_string(),
                min: 40.0,
                max: 80.0,
                side: AxisSide::Right,
            },
            Axis {
                id: AxisId::Light,
                label: "Light Level (lux)".to_string(),
                min: 0.0,
                max: 1000.0,
                side: AxisSide::Left,
            },
        ];

        let series = vec![
            Series {
                axis: AxisId::Temperature,
                name: "Temperature (°C)".to_string(),
                color: "#ff9800".to_string(),
                values: samples.iter().map(|s| s.temperature).collect(),
            },
            Series {
                axis: AxisId::Humidity,
                name: "Humidity (%)".to_string(),
                color: "#2196f3".to_string(),
                values: samples.iter().map(|s| s.humidity).collect(),
            },
            Series {
                axis: AxisId::Light,
                name: "Light Level (lux)".to_string(),
                color: "#4caf50".to_string(),
                values: samples.iter().map(|s| s.light).collect(),
            },
        ];

        Self {
            categories,
            x_tick_angle: X_TICK_ANGLE,
            axes,
            series,
        }
    }

    pub fn axis(&self, id: AxisId) -> Option<&Axis> {
        self.axes.iter().find(|a| a.id == id)
    }

    pub fn series(&self, id: AxisId) -> Option<&Series> {
        self.series.iter().find(|s| s.axis == id)
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Render as a standalone SVG element of the given pixel size
    pub fn render_svg(&self, width: u32, height: u32) -> String {
        let layout = Layout::new(width, height, self.categories.len());
        let mut svg = String::new();

        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="system-ui, sans-serif" font-size="12">"#,
            w = width,
            h = height
        );
        let _ = write!(
            svg,
            r#"<defs><clipPath id="plot-area"><rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"/></clipPath></defs>"#,
            layout.left, layout.top, layout.plot_width, layout.plot_height
        );

        self.render_grid(&mut svg, &layout);
        self.render_axes(&mut svg, &layout);
        self.render_x_labels(&mut svg, &layout);

        svg.push_str(r#"<g clip-path="url(#plot-area)">"#);
        for series in &self.series {
            if let Some(axis) = self.axis(series.axis) {
                render_series(&mut svg, &layout, axis, series, &self.categories);
            }
        }
        svg.push_str("</g>");

        self.render_legend(&mut svg, &layout);
        svg.push_str("</svg>");
        svg
    }

    fn render_grid(&self, svg: &mut String, layout: &Layout) {
        svg.push_str(r##"<g stroke="#e0e0e0" stroke-dasharray="3 3">"##);
        for i in 0..=GRID_LINES {
            let y = layout.top + layout.plot_height * f64::from(i) / f64::from(GRID_LINES);
            let _ = write!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"/>"#,
                layout.left,
                y,
                layout.left + layout.plot_width,
                y
            );
        }
        for i in 0..self.categories.len() {
            let x = layout.x(i);
            let _ = write!(
                svg,
                r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"/>"#,
                x,
                layout.top,
                x,
                layout.top + layout.plot_height
            );
        }
        svg.push_str("</g>");
    }

    fn render_axes(&self, svg: &mut String, layout: &Layout) {
        let mut left_offset = 0.0;
        for axis in &self.axes {
            let (x, anchor, tick_dir) = match axis.side {
                AxisSide::Left => {
                    let x = layout.left - left_offset;
                    left_offset += AXIS_SPACING;
                    (x, "end", -1.0)
                }
                AxisSide::Right => (layout.left + layout.plot_width, "start", 1.0),
            };

            let _ = write!(
                svg,
                r##"<g class="axis" data-axis="{}"><line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="#666"/>"##,
                axis_name(axis.id),
                layout.top,
                layout.top + layout.plot_height,
                x = x
            );
            for i in 0..=GRID_LINES {
                let fraction = f64::from(i) / f64::from(GRID_LINES);
                let value = axis.min + (axis.max - axis.min) * fraction;
                let y = layout.top + layout.plot_height * (1.0 - fraction);
                let _ = write!(
                    svg,
                    r##"<text x="{:.1}" y="{:.1}" text-anchor="{}" dominant-baseline="middle" fill="#666">{}</text>"##,
                    x + tick_dir * 4.0,
                    y,
                    anchor,
                    format_tick(value)
                );
            }
            let label_x = x + tick_dir * (AXIS_SPACING - 8.0);
            let label_y = layout.top + layout.plot_height / 2.0;
            let rotation = if tick_dir < 0.0 { -90 } else { 90 };
            let _ = write!(
                svg,
                r#"<text x="{lx:.1}" y="{ly:.1}" text-anchor="middle" transform="rotate({rot} {lx:.1} {ly:.1})">{label}</text></g>"#,
                lx = label_x,
                ly = label_y,
                rot = rotation,
                label = escape(&axis.label)
            );
        }
    }

    fn render_x_labels(&self, svg: &mut String, layout: &Layout) {
        let y = layout.top + layout.plot_height + 12.0;
        for (i, category) in self.categories.iter().enumerate() {
            let x = layout.x(i);
            let _ = write!(
                svg,
                r#"<text class="x-tick" x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate({a} {x:.1} {y:.1})">{label}</text>"#,
                x = x,
                y = y,
                a = self.x_tick_angle,
                label = escape(category)
            );
        }
    }

    fn render_legend(&self, svg: &mut String, layout: &Layout) {
        let y = f64::from(layout.height) - 10.0;
        let mut x = layout.left;
        for series in &self.series {
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="12" height="4" fill="{}"/><text x="{:.1}" y="{:.1}">{}</text>"#,
                x,
                y - 4.0,
                series.color,
                x + 16.0,
                y,
                escape(&series.name)
            );
            x += 150.0;
        }
    }
}

const GRID_LINES: u8 = 4;
const AXIS_SPACING: f64 = 55.0;

/// Pixel geometry of the plot area
struct Layout {
    height: u32,
    left: f64,
    top: f64,
    plot_width: f64,
    plot_height: f64,
    points: usize,
}

impl Layout {
    fn new(width: u32, height: u32, points: usize) -> Self {
        let left = 2.0 * AXIS_SPACING + 10.0;
        let right = AXIS_SPACING + 10.0;
        let top = 20.0;
        let bottom = 110.0;
        Self {
            height,
            left,
            top,
            plot_width: (f64::from(width) - left - right).max(1.0),
            plot_height: (f64::from(height) - top - bottom).max(1.0),
            points,
        }
    }

    fn x(&self, index: usize) -> f64 {
        if self.points <= 1 {
            self.left + self.plot_width / 2.0
        } else {
            self.left + self.plot_width * index as f64 / (self.points - 1) as f64
        }
    }

    fn y(&self, axis: &Axis, value: f64) -> f64 {
        self.top + self.plot_height * (1.0 - axis.fraction(value))
    }
}

/// Draw a series as connected runs; gaps split the line, lone points get a dot.
/// Every point also gets a transparent hover target titled with its reading.
fn render_series(
    svg: &mut String,
    layout: &Layout,
    axis: &Axis,
    series: &Series,
    categories: &[String],
) {
    let _ = write!(
        svg,
        r#"<g class="series" data-axis="{}" stroke="{c}" fill="{c}">"#,
        axis_name(axis.id),
        c = series.color
    );

    let mut run: Vec<(f64, f64)> = Vec::new();
    let flush = |run: &mut Vec<(f64, f64)>, svg: &mut String| {
        match run.len() {
            0 => {}
            1 => {
                let (x, y) = run[0];
                let _ = write!(
                    svg,
                    r#"<circle class="dot" cx="{:.1}" cy="{:.1}" r="3"/>"#,
                    x, y
                );
            }
            _ => {
                let mut d = String::new();
                for (i, (x, y)) in run.iter().enumerate() {
                    let _ = write!(d, "{}{:.1},{:.1} ", if i == 0 { "M" } else { "L" }, x, y);
                }
                let _ = write!(
                    svg,
                    r#"<path d="{}" fill="none" stroke-width="2"/>"#,
                    d.trim_end()
                );
            }
        }
        run.clear();
    };

    for (i, value) in series.values.iter().enumerate() {
        match value {
            Some(v) if v.is_finite() => run.push((layout.x(i), layout.y(axis, *v))),
            _ => flush(&mut run, svg),
        }
    }
    flush(&mut run, svg);

    for (i, value) in series.values.iter().enumerate() {
        let Some(v) = *value else {
            continue;
        };
        if !v.is_finite() {
            continue;
        }
        let category = categories.get(i).map(String::as_str).unwrap_or_default();
        let _ = write!(
            svg,
            r#"<circle class="point" cx="{:.1}" cy="{:.1}" r="6" fill-opacity="0" stroke="none"><title>{}: {}</title></circle>"#,
            layout.x(i),
            layout.y(axis, v),
            escape(category),
            v
        );
    }

    svg.push_str("</g>");
}

fn axis_name(id: AxisId) -> &'static str {
    match id {
        AxisId::Temperature => "temperature",
        AxisId::Humidity => "humidity",
        AxisId::Light => "light",
    }
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Escape text for inclusion in HTML or SVG markup
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
