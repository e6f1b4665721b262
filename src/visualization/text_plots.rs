/// Render a series as an ASCII scatter plot
pub fn plot_series(values: &[f32], title: &str, width: usize, height: usize) -> String {
    if values.is_empty() || width < 10 || height < 5 {
        return format!("{}: Invalid data or dimensions", title);
    }

    let min_val = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if (max_val - min_val).abs() < f32::EPSILON {
        return format!("{}: All {} values are {:.4}", title, values.len(), min_val);
    }

    let mut plot = vec![vec![' '; width]; height];

    // Add axes
    for row in plot.iter_mut() {
        row[0] = '|';
    }
    for cell in plot[height - 1].iter_mut() {
        *cell = '-';
    }
    plot[height - 1][0] = '+';

    // Plot data points
    let x_span = (values.len().max(2) - 1) as f32;
    let y_scale = (height - 3) as f32 / (max_val - min_val);

    for (i, &value) in values.iter().enumerate() {
        let x = ((i as f32 / x_span * (width - 3) as f32) as usize + 2).min(width - 1);
        let offset = ((value - min_val) * y_scale) as usize;
        let y = (height - 3).saturating_sub(offset).min(height - 2);
        plot[y][x] = '*';
    }

    // Build output string
    let mut output = format!("{}\n", title);
    output.push_str(&format!("Max: {:.4}\n", max_val));

    for row in plot.iter() {
        output.push_str(&row.iter().collect::<String>());
        output.push('\n');
    }

    output.push_str(&format!("Min: {:.4}\n", min_val));
    output.push_str(&format!("Points: {}\n", values.len()));

    output
}
