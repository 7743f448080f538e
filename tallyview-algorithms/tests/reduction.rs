#![allow(clippy::uninlined_format_args)]
use approx::assert_relative_eq;
use ndarray::{s, Array, Array2, Array3, ArrayD, Axis};
use tallyview_algorithms::{
    create_tally_image, reduce_domain, reduce_mesh, relative_error, slice_index, TallyImageOutcome,
};
use tallyview_core::{
    AppliedFilters, Basis, Filter, FilterKind, FilterSelection, IdMap, MeshFilter, PlotView,
    RegularMesh, Selection, StatePoint, Statistic, Tally, UnitWarnings, UniverseCells,
};

const FLUX_UNITS: &str = "Particle-cm per Source Particle";

fn cell_tally() -> (Tally, Filter) {
    let filter = Filter::new(1, FilterKind::Cell { bins: vec![10, 20] });
    let mean = Array::from_shape_vec((2, 1, 1), vec![3.5, 7.25])
        .unwrap()
        .into_dyn();
    let std_dev = Array::from_shape_vec((2, 1, 1), vec![0.35, 0.0])
        .unwrap()
        .into_dyn();
    let tally = Tally::new(
        1,
        vec![filter.clone()],
        vec!["flux".into()],
        vec!["total".into()],
        mean,
        std_dev,
    )
    .unwrap();
    (tally, filter)
}

/// Left half cell 10, right half cell 20, bottom row cell 30.
fn cell_map() -> IdMap {
    let cells = Array2::from_shape_fn((4, 6), |(r, c)| match (r, c) {
        (3, _) => 30,
        (_, c) if c < 3 => 10,
        _ => 20,
    });
    IdMap::new(cells, Array2::zeros((4, 6)), Array2::from_elem((4, 6), 1)).unwrap()
}

fn flux_selection(filters: AppliedFilters) -> Selection {
    Selection::new()
        .with_filters(filters)
        .with_score("flux")
        .with_nuclide("total")
}

#[test]
fn test_cell_filter_example() {
    let (tally, filter) = cell_tally();
    let selection = flux_selection(AppliedFilters::new().with(filter.id, FilterSelection::All));
    let ids = cell_map();
    let image = reduce_domain(
        &tally,
        Statistic::Mean,
        &selection,
        &ids,
        &UniverseCells::new(),
    )
    .unwrap();

    for ((r, c), &cell) in ids.cells().indexed_iter() {
        let expected = match cell {
            10 => Some(3.5),
            20 => Some(7.25),
            _ => None,
        };
        assert_eq!(image.image.get(r, c), expected, "pixel ({}, {})", r, c);
    }
    assert_eq!(image.extents, None);
    assert_eq!(image.units, FLUX_UNITS);
    assert_eq!((image.data_min, image.data_max), (3.5, 7.25));
}

#[test]
fn test_cell_filter_partial_example() {
    let (tally, filter) = cell_tally();
    let selection = flux_selection(
        AppliedFilters::new().with(filter.id, FilterSelection::Partial(vec![0])),
    );
    let ids = cell_map();
    let image = reduce_domain(
        &tally,
        Statistic::Mean,
        &selection,
        &ids,
        &UniverseCells::new(),
    )
    .unwrap();

    for ((r, c), &cell) in ids.cells().indexed_iter() {
        let expected = (cell == 10).then_some(3.5);
        assert_eq!(image.image.get(r, c), expected, "pixel ({}, {})", r, c);
    }
}

#[test]
fn test_domain_relative_error() {
    let (tally, filter) = cell_tally();
    let selection = flux_selection(AppliedFilters::all([&filter]));
    let ids = cell_map();
    let universes = UniverseCells::new();

    let rel = reduce_domain(&tally, Statistic::RelError, &selection, &ids, &universes).unwrap();
    assert_eq!(rel.units, "% error");
    assert_relative_eq!(rel.image.get(0, 0).unwrap(), 10.0, epsilon = 1e-12);
    // std. dev. of cell 20 is zero
    assert_eq!(rel.image.get(0, 5), Some(0.0));
    assert_eq!(rel.image.get(3, 0), None);
}

fn mesh_4x4x4() -> (Tally, MeshFilter, ArrayD<f64>) {
    let mesh = RegularMesh::new_3d(1, [0.0; 3], [4.0, 8.0, 12.0], [4, 4, 4]).unwrap();
    let mesh_filter = MeshFilter::new(mesh);
    let filter = Filter::new(2, FilterKind::Mesh(mesh_filter.clone()));
    let mean = Array::from_shape_fn((64, 1, 1), |(bin, _, _)| (bin * bin % 17) as f64 + 1.0)
        .into_dyn();
    let std_dev = mean.mapv(|v| if v > 10.0 { 0.0 } else { v.sqrt() });
    let tally = Tally::new(
        3,
        vec![filter],
        vec!["flux".into()],
        vec!["total".into()],
        mean.clone(),
        std_dev,
    )
    .unwrap();
    (tally, mesh_filter, mean)
}

fn grid(values: &ArrayD<f64>) -> Array3<f64> {
    values
        .index_axis(Axis(2), 0)
        .index_axis(Axis(1), 0)
        .to_owned()
        .into_shape_with_order((4, 4, 4))
        .unwrap()
}

fn mesh_selection() -> Selection {
    flux_selection(AppliedFilters::new().with(2, FilterSelection::All))
}

#[test]
fn test_mesh_layer_example() {
    let (tally, mesh_filter, mean) = mesh_4x4x4();
    // z width is 3, so z = 7.0 is in layer 2
    let view = PlotView::new([2.0, 4.0, 7.0], 4.0, 8.0);
    assert_eq!(slice_index(&mesh_filter.mesh, &view), Some(2));

    let image = reduce_mesh(&tally, Statistic::Mean, &mesh_selection(), &mesh_filter, &view)
        .unwrap()
        .unwrap();
    let expected = grid(&mean).slice(s![2, ..;-1, ..]).to_owned();
    assert_eq!(image.image.values(), &expected);
    assert_eq!(image.extents, Some([0.0, 4.0, 0.0, 8.0]));
    assert_eq!(image.units, FLUX_UNITS);
}

#[test]
fn test_mesh_basis_invariance() {
    let (tally, mesh_filter, mean) = mesh_4x4x4();
    let grid = grid(&mean);
    let selection = mesh_selection();

    // the voxel with (i, j, k) = (1, 2, 3) seen from every basis
    let origin = [1.5, 5.0, 10.5];
    let expected = grid[[3, 2, 1]];
    for basis in [Basis::Xy, Basis::Xz, Basis::Yz] {
        let mut view = PlotView::new(origin, 4.0, 4.0);
        view.basis = basis;
        let image = reduce_mesh(&tally, Statistic::Mean, &selection, &mesh_filter, &view)
            .unwrap()
            .unwrap();
        let (h, v, _) = basis.axes();
        let index = [1, 2, 3];
        let row = 3 - index[v];
        let col = index[h];
        assert_eq!(image.image.values()[[row, col]], expected, "basis {}", basis);
    }
}

#[test]
fn test_mesh_relative_error() {
    let (tally, mesh_filter, _) = mesh_4x4x4();
    let view = PlotView::new([2.0, 4.0, 1.0], 4.0, 8.0);
    let selection = mesh_selection();
    let reduce = |statistic| {
        reduce_mesh(&tally, statistic, &selection, &mesh_filter, &view)
            .unwrap()
            .unwrap()
    };
    let mean = reduce(Statistic::Mean);
    let std_dev = reduce(Statistic::StdDev);
    let rel = reduce(Statistic::RelError);

    let expected = relative_error(mean.image.values(), std_dev.image.values());
    assert_eq!(rel.image.values(), &expected);
    assert!(rel.image.values().iter().all(|v| v.is_finite()));
    assert_eq!(rel.extents, mean.extents);
}

#[test]
fn test_mesh_relative_error_zero_mean() {
    let (tally, mesh_filter, mut mean) = mesh_4x4x4();
    // voxel (i, j, k) = (1, 2, 0) has flat bin 1 + 4 * 2 = 9
    mean[[9, 0, 0]] = 0.0;
    let mut std_dev = tally.std_dev().clone();
    std_dev[[9, 0, 0]] = 0.5;
    let tally = Tally::new(
        tally.id,
        tally.filters().to_vec(),
        tally.scores().to_vec(),
        tally.nuclides().to_vec(),
        mean,
        std_dev,
    )
    .unwrap();

    let view = PlotView::new([2.0, 4.0, 1.0], 4.0, 8.0);
    let rel = reduce_mesh(&tally, Statistic::RelError, &mesh_selection(), &mesh_filter, &view)
        .unwrap()
        .unwrap();
    // row 3 - j, column i
    assert_eq!(rel.image.values()[[1, 1]], 0.0);
    assert!(rel.image.values().iter().all(|v| v.is_finite()));
    assert!(rel.image.values().iter().any(|&v| v > 0.0));
}

#[test]
fn test_reduction_is_idempotent() {
    let (tally, mesh_filter, _) = mesh_4x4x4();
    let mut view = PlotView::new([2.0, 4.0, 7.0], 4.0, 8.0);
    view.basis = Basis::Xz;
    view.origin[1] = 3.0;
    let selection = mesh_selection();
    let first = reduce_mesh(&tally, Statistic::RelError, &selection, &mesh_filter, &view).unwrap();
    let second = reduce_mesh(&tally, Statistic::RelError, &selection, &mesh_filter, &view).unwrap();
    assert_eq!(first, second);

    let (tally, filter) = cell_tally();
    let selection = flux_selection(AppliedFilters::all([&filter]));
    let ids = cell_map();
    let universes = UniverseCells::new();
    let first = reduce_domain(&tally, Statistic::StdDev, &selection, &ids, &universes).unwrap();
    let second = reduce_domain(&tally, Statistic::StdDev, &selection, &ids, &universes).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_dispatch_mesh_out_of_range() {
    let (tally, _, _) = mesh_4x4x4();
    let mut statepoint = StatePoint::new();
    statepoint.add_tally(tally);

    let mut view = PlotView::new([2.0, 4.0, 50.0], 4.0, 8.0);
    view.h_res = 4;
    view.v_res = 8;
    view.selected_tally = Some(3);
    view.selection = mesh_selection();
    let ids = IdMap::new(
        Array2::zeros((8, 4)),
        Array2::zeros((8, 4)),
        Array2::zeros((8, 4)),
    )
    .unwrap();

    let mut warnings = UnitWarnings::new();
    let outcome = create_tally_image(&statepoint, &view, &ids, &mut warnings).unwrap();
    assert!(matches!(outcome, TallyImageOutcome::NoImage(_)));
    assert!(outcome.message().unwrap().contains("tally 3"));

    view.origin[2] = 11.9;
    let outcome = create_tally_image(&statepoint, &view, &ids, &mut warnings).unwrap();
    let image = outcome.into_image().unwrap();
    assert_eq!(image.image.dim(), (4, 4));
}
