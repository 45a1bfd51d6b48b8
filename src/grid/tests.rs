use crate::aggregate::{ProfileData, ProfileRow};
use crate::grid::*;
use crate::layout::parse_struct;
use color_eyre::eyre::{Report, Result};

fn profile(bars: &[(&str, &str, f64)], keys: &[&str]) -> ProfileData {
    let rows = bars
        .iter()
        .map(|(group, x, sum)| ProfileRow {
            group: group.to_string(),
            x: x.to_string(),
            values: vec![*sum],
            sum: *sum,
            keys: vec![0.; keys.len()],
            ..Default::default()
        })
        .collect();
    ProfileData {
        group: "gene".to_string(),
        x: "mutation".to_string(),
        stacks: vec!["b1".to_string()],
        keys: keys.iter().map(|k| k.to_string()).collect(),
        rows,
        ..Default::default()
    }
}

fn bare_options() -> GridOptions {
    GridOptions {
        width: 1000.,
        row_height: 200.,
        margin: 0.,
        axis_width: 0.,
        xticks_height: 0.,
        gap: 0.,
        legend_width: 0.,
    }
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn panels_follow_counts() -> Result<(), Report> {
    let data = profile(
        &[("S", "D614G", 10.), ("S", "N501Y", 4.), ("S", "T478K", 2.), ("N", "R203K", 30.), ("E", "T9I", 1.)],
        &[],
    );
    let grid = Grid::new(&data, &parse_struct("S,N/E"), &bare_options())?;

    assert!(close(grid.height, 400.));
    assert!(close(grid.profile.width, 1000. * 21. / 22.5));
    assert_eq!(grid.rows.len(), 2);

    let first = &grid.rows[0];
    assert!(first.filler.is_none());
    assert!(close(first.panels[0].bars.width, first.panels[1].bars.width * 3.));
    assert!(first.panels[0].first && !first.panels[1].first);
    assert_eq!(first.ymax, 30.);
    assert_eq!(first.ylim, 31.);
    assert!(first.panels.iter().all(|p| p.heatmap.is_none()));
    assert!(close(first.panels[0].title.height, 200. / 9.5));

    let second = &grid.rows[1];
    let filler = second.filler.expect("row with E is narrower");
    assert!(close(filler.width, second.panels[0].bars.width * 3.));
    assert_eq!(second.yticks, [1.]);
    Ok(())
}

#[test]
fn heatmap_cells_with_keys() -> Result<(), Report> {
    let data = profile(&[("S", "D614G", 10.)], &["BA.2"]);
    let grid = Grid::new(&data, &parse_struct("S"), &bare_options())?;
    let panel = &grid.rows[0].panels[0];
    let heatmap = panel.heatmap.expect("keys add a heatmap");
    assert!(close(heatmap.height, 200. * 1.5 / 9.5));
    assert!(close(panel.bars.bottom(), heatmap.y));
    Ok(())
}

#[test]
fn unknown_group_fails() {
    let data = profile(&[("S", "D614G", 10.)], &[]);
    assert!(Grid::new(&data, &parse_struct("S,N"), &bare_options()).is_err());
    assert!(Grid::new(&data, &Vec::new(), &bare_options()).is_err());
}

#[test]
fn y_axis_limits() {
    assert_eq!(ylim(0.), 1.);
    assert_eq!(ylim(4.), 5.);
    assert_eq!(yticks(66.67), [17., 33., 50., 67.]);
}

#[test]
fn bar_slots() -> Result<(), Report> {
    let data = profile(&[("S", "D614G", 1.), ("S", "N501Y", 1.)], &[]);
    let grid = Grid::new(&data, &parse_struct("S"), &bare_options())?;
    let panel = &grid.rows[0].panels[0];
    let (x, width) = panel.slot(1);
    assert!(close(width, panel.bars.width / 2.));
    assert!(close(x + width, panel.bars.right()));
    Ok(())
}
