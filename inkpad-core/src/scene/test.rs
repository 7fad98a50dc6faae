use super::Scene;
use crate::{
    color::Color,
    commands::{unite_commands, Command, CommandConsumer, CommandError, DoUndo, ScopeType},
    component::{Component, ComponentID, ComponentStyle},
    history::History,
    path::Path,
    renderer::{DummyRenderer, RenderingStyle, TextStyle},
    transform::Matrix,
    util::Rect,
    viewport::Viewport,
};

fn line(from: [f32; 2], to: [f32; 2]) -> Component {
    Component::stroke(
        Path::new(from).line_to(to),
        RenderingStyle::stroked(Color::BLACK, 2.0),
    )
}
fn add(scene: &mut Scene, component: Component) -> ComponentID {
    let command = scene.add_component(component);
    let id = command.target_ids()[0];
    scene.apply(DoUndo::Do(&command)).unwrap();
    id
}
/// Everything observable about the scene's contents, in paint order.
fn snapshot(scene: &Scene) -> (Vec<(ComponentID, i64, Rect)>, Rect) {
    (
        scene
            .get_all_components()
            .map(|c| (c.id(), c.z_index(), c.bbox()))
            .collect(),
        scene.import_export_rect(),
    )
}
/// Deterministic scatter of points, so failures are reproducible.
fn scatter(seed: u64) -> impl Iterator<Item = [f32; 2]> {
    let mut state = seed;
    std::iter::repeat_with(move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let x = (state >> 40) as f32 / (1u64 << 24) as f32;
        let y = ((state >> 16) & 0xFF_FFFF) as f32 / (1u64 << 24) as f32;
        [x * 2000.0 - 500.0, y * 2000.0 - 500.0]
    })
}

#[test]
fn first_component_gets_zero() {
    let mut scene = Scene::default();
    assert_eq!(scene.next_z_index(), 0);
    let a = add(&mut scene, line([0.0, 0.0], [1.0, 1.0]));
    let b = add(&mut scene, line([0.0, 0.0], [1.0, 1.0]));
    assert_eq!(scene.get(a).unwrap().z_index(), 0);
    assert_eq!(scene.get(b).unwrap().z_index(), 1);
    assert_eq!(scene.next_z_index(), 2);
}
#[test]
fn united_adds_keep_order() {
    let mut scene = Scene::default();
    let mut history = History::new();
    let first = scene.add_component(line([0.0, 0.0], [1.0, 1.0]));
    let second = scene.add_component(line([0.0, 0.0], [1.0, 1.0]));
    let third = scene.add_component(line([0.0, 0.0], [1.0, 1.0]));
    let ids: Vec<_> = [&first, &second, &third]
        .iter()
        .map(|c| c.target_ids()[0])
        .collect();
    history
        .push(&mut scene, unite_commands(vec![first, second, third]))
        .unwrap();
    let order: Vec<_> = scene.get_all_components().map(Component::id).collect();
    assert_eq!(order, ids);
    let z: Vec<_> = ids.iter().map(|id| scene.get(*id).unwrap().z_index()).collect();
    assert_eq!(z, [0, 1, 2]);

    assert!(history.undo(&mut scene).unwrap());
    assert!(scene.is_empty());
}
#[test]
fn every_command_round_trips() {
    let mut scene = Scene::default();
    let a = add(&mut scene, line([0.0, 0.0], [100.0, 0.0]));
    let b = add(&mut scene, line([0.0, 50.0], [100.0, 50.0]));
    let text = add(
        &mut scene,
        Component::text("hi", TextStyle::default(), Matrix::translation(5.0, 80.0)),
    );
    add(
        &mut scene,
        Component::background(Rect::new(0.0, 0.0, 500.0, 500.0), Color::WHITE, None),
    );

    let bigger = TextStyle {
        size: 40.0,
        ..TextStyle::default()
    };
    let commands = [
        scene.add_component(line([5.0, 5.0], [6.0, 6.0])),
        scene.remove_components(&[a, b]),
        scene.transform_components(&[a, text], &Matrix::rotation(0.5), true),
        scene.set_z_index(b, -4).unwrap(),
        scene.restyle(text, ComponentStyle::Text(bigger)).unwrap(),
        scene.set_import_export_rect(Rect::new(-10.0, -10.0, 20.0, 20.0)),
        scene.duplicate_components(&[a, b, text]),
        scene.add_components([line([1.0, 1.0], [2.0, 2.0]), line([3.0, 3.0], [4.0, 4.0])]),
    ];
    let before = snapshot(&scene);
    for command in &commands {
        scene.apply(DoUndo::Do(command)).unwrap();
        assert_ne!(snapshot(&scene), before, "{} changed nothing", command.kind());
        scene.apply(DoUndo::Undo(command)).unwrap();
        assert_eq!(snapshot(&scene), before, "{} didn't round trip", command.kind());
    }
    // Inverting swaps do and undo.
    for command in &commands {
        scene.apply(DoUndo::Do(command)).unwrap();
        scene.apply(DoUndo::Do(&command.invert())).unwrap();
        assert_eq!(snapshot(&scene), before);
    }
}
#[test]
fn undo_redo_symmetry() {
    let mut scene = Scene::default();
    let mut history = History::new();
    let mut snapshots = vec![snapshot(&scene)];
    let mut ids = Vec::new();
    for (i, point) in scatter(7).take(12).enumerate() {
        let command = match i % 3 {
            0 | 1 => {
                let command = scene.add_component(line(point, [point[0] + 10.0, point[1]]));
                ids.extend(command.target_ids());
                command
            }
            _ => scene.transform_components(&ids, &Matrix::translation(3.0, -1.0), i % 2 == 0),
        };
        history.push(&mut scene, command).unwrap();
        snapshots.push(snapshot(&scene));
    }
    for expected in snapshots.iter().rev().skip(1) {
        assert!(history.undo(&mut scene).unwrap());
        assert_eq!(&snapshot(&scene), expected);
    }
    assert!(!history.undo(&mut scene).unwrap());
    for expected in snapshots.iter().skip(1) {
        assert!(history.redo(&mut scene).unwrap());
        assert_eq!(&snapshot(&scene), expected);
    }
}
#[test]
fn query_matches_brute_force() {
    let mut scene = Scene::new(64.0);
    let points: Vec<_> = scatter(42).take(400).collect();
    for pair in points.chunks_exact(2) {
        let to = [pair[0][0] + pair[1][0] * 0.1, pair[0][1] + pair[1][1] * 0.1];
        add(&mut scene, line(pair[0], to));
    }
    add(
        &mut scene,
        Component::background(Rect::new(-1.0e5, -1.0e5, 2.0e5, 2.0e5), Color::WHITE, None),
    );

    for corner in scatter(1234).take(100) {
        let region = Rect::new(corner[0], corner[1], 150.0, 90.0);
        let mut found: Vec<_> = scene
            .get_elements_intersecting_region(&region)
            .iter()
            .map(|c| c.id())
            .collect();
        let mut expected: Vec<_> = scene
            .get_all_components()
            .filter(|c| !c.is_background() && c.bbox().intersects(&region))
            .map(Component::id)
            .collect();
        found.sort_unstable();
        expected.sort_unstable();
        let unique = {
            let mut unique = found.clone();
            unique.dedup();
            unique.len()
        };
        assert_eq!(unique, found.len(), "duplicate results");
        assert_eq!(found, expected);

        let with_background = scene.get_elements_intersecting_region_with_background(&region);
        assert_eq!(with_background.len(), found.len() + 1);
    }
}
#[test]
fn query_includes_bounds_without_ink() {
    let mut scene = Scene::default();
    let diagonal = add(&mut scene, line([0.0, 0.0], [100.0, 100.0]));
    // Inside the bounding box, far from the line itself.
    let corner = Rect::new(90.0, 0.0, 5.0, 5.0);
    assert!(scene.get(diagonal).unwrap().bbox().intersects(&corner));
    let found: Vec<_> = scene
        .get_elements_intersecting_region(&corner)
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(found, [diagonal]);
    assert!(scene.get_elements_hit_by_region(&corner).is_empty());

    let on_line = Rect::new(48.0, 48.0, 4.0, 4.0);
    let hit: Vec<_> = scene
        .get_elements_hit_by_region(&on_line)
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(hit, [diagonal]);
}
#[test]
fn overlapping_strokes() {
    let mut scene = Scene::default();
    let horizontal = add(&mut scene, line([0.0, 50.0], [100.0, 50.0]));
    let vertical = add(&mut scene, line([50.0, 0.0], [50.0, 100.0]));
    let mut at_crossing: Vec<_> = scene
        .get_elements_intersecting_region(&Rect::new(45.0, 45.0, 10.0, 10.0))
        .iter()
        .map(|c| c.id())
        .collect();
    at_crossing.sort_unstable();
    let mut both = vec![horizontal, vertical];
    both.sort_unstable();
    assert_eq!(at_crossing, both);

    let near_end: Vec<_> = scene
        .get_elements_intersecting_region(&Rect::new(90.0, 45.0, 5.0, 10.0))
        .iter()
        .map(|c| c.id())
        .collect();
    assert_eq!(near_end, [horizontal]);
    assert!(scene
        .get_elements_intersecting_region(&Rect::new(10.0, 10.0, 5.0, 5.0))
        .is_empty());
}
#[test]
fn paint_order() {
    let mut scene = Scene::default();
    let a = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let b = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let c = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let bg = add(
        &mut scene,
        Component::background(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE, None),
    );
    let order = |scene: &Scene| -> Vec<ComponentID> {
        scene.get_all_components().map(Component::id).collect()
    };
    // Backgrounds first, despite the highest z.
    assert_eq!(order(&scene), [bg, a, b, c]);

    let raise = scene.set_z_index(a, 10).unwrap();
    scene.apply(DoUndo::Do(&raise)).unwrap();
    assert_eq!(order(&scene), [bg, b, c, a]);

    // Equal z-indices fall back to id order, and stay stable.
    let tie = scene.set_z_index(c, 1).unwrap();
    scene.apply(DoUndo::Do(&tie)).unwrap();
    let (first, second) = if b < c { (b, c) } else { (c, b) };
    assert_eq!(order(&scene), [bg, first, second, a]);
    assert_eq!(order(&scene), [bg, first, second, a]);

    let background_ids: Vec<_> = scene.get_background_components().map(Component::id).collect();
    assert_eq!(background_ids, [bg]);
}
#[test]
fn reorder_to_top_keeps_relative_order() {
    let mut scene = Scene::default();
    let a = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let b = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let c = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let command = scene.transform_components(&[b, a], &Matrix::translation(1.0, 0.0), true);
    scene.apply(DoUndo::Do(&command)).unwrap();
    let order: Vec<_> = scene.get_all_components().map(Component::id).collect();
    assert_eq!(order, [c, a, b]);
}
#[test]
fn builders_skip_unknown() {
    let mut scene = Scene::default();
    let a = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let ghost = ComponentID::default();
    let Command::Erase { components } = scene.remove_components(&[a, ghost, a]) else {
        panic!("not an erase");
    };
    assert_eq!(components.len(), 1);
    assert_eq!(scene.set_z_index(ghost, 3), Err(CommandError::UnknownResource));
    let background_style = ComponentStyle::Background {
        color: Color::BLACK,
        grid: None,
    };
    // Valid target, wrong kind of style: built fine, fails to apply without changes.
    let restyle = scene.restyle(a, background_style).unwrap();
    let before = snapshot(&scene);
    assert_eq!(
        scene.apply(DoUndo::Do(&restyle)),
        Err(CommandError::MismatchedState)
    );
    assert_eq!(snapshot(&scene), before);
}
#[test]
fn failed_scope_rolls_back() {
    let mut scene = Scene::default();
    let existing_id = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let fresh = line([20.0, 20.0], [30.0, 30.0]);
    let fresh_id = fresh.id();
    let before = snapshot(&scene);
    let scope = Command::Scope(
        ScopeType::Atoms,
        Box::new([
            Command::Add(Box::new(fresh)),
            scene.set_z_index(existing_id, 5).unwrap(),
            // Already present: fails after the first two applied.
            Command::Add(Box::new(scene.get(existing_id).unwrap().clone())),
        ]),
    );
    assert_eq!(
        scene.apply(DoUndo::Do(&scope)),
        Err(CommandError::MismatchedState)
    );
    assert!(!scene.contains(fresh_id));
    assert_eq!(snapshot(&scene), before);
}
#[test]
fn damage_covers_old_and_new_bounds() {
    let mut scene = Scene::default();
    let id = add(&mut scene, line([0.0, 0.0], [10.0, 0.0]));
    scene.take_damage();
    let old = scene.get(id).unwrap().bbox();
    let command = scene.transform_components(&[id], &Matrix::translation(1000.0, 0.0), false);
    scene.apply(DoUndo::Do(&command)).unwrap();
    let new = scene.get(id).unwrap().bbox();
    let damage = scene.take_damage();
    assert!(damage.contains(&old));
    assert!(damage.contains(&new));
    // Nothing near the middle was touched.
    let untouched = Rect::new(300.0, -50.0, 100.0, 100.0);
    assert!(damage.iter().all(|rect| !rect.intersects(&untouched)));
    assert!(!scene.has_damage());
}
#[test]
fn undrained_damage_stays_bounded() {
    let mut scene = Scene::default();
    let mut history = History::new();
    for i in 0..super::MAX_DAMAGE_RECTS * 2 {
        let offset = i as f32 * 10.0;
        let command = scene.add_component(line([offset, 0.0], [offset + 5.0, 0.0]));
        history.push(&mut scene, command).unwrap();
    }
    let first = scene.get_all_components().next().unwrap().bbox();
    let last = scene.get_all_components().last().unwrap().bbox();
    let damage = scene.take_damage();
    assert!(damage.len() <= super::MAX_DAMAGE_RECTS);
    // Merged, but nothing lost.
    assert!(damage.iter().any(|rect| rect.contains_rect(&first)));
    assert!(damage.iter().any(|rect| rect.contains_rect(&last)));
}
#[test]
fn render_follows_transform() {
    let mut scene = Scene::default();
    let id = add(&mut scene, line([10.0, 10.0], [20.0, 10.0]));
    let view = Viewport::new([100, 100]);
    let mut dummy = DummyRenderer::new();
    scene.render(&mut dummy, &view);
    assert_eq!(dummy.counts().paths, 1);

    let command = scene.transform_components(&[id], &Matrix::translation(500.0, 0.0), false);
    scene.apply(DoUndo::Do(&command)).unwrap();
    dummy.reset();
    scene.render(&mut dummy, &view);
    assert_eq!(dummy.counts().paths, 0);
    assert_eq!(scene.render_cost(&view.visible_rect()), 0);
}
#[test]
fn duplicates_go_on_top() {
    let mut scene = Scene::default();
    let a = add(&mut scene, line([0.0, 0.0], [10.0, 10.0]));
    let command = scene.duplicate_components(&[a]);
    scene.apply(DoUndo::Do(&command)).unwrap();
    assert_eq!(scene.len(), 2);
    let top = scene.get_all_components().last().unwrap();
    assert_ne!(top.id(), a);
    assert_eq!(top.bbox(), scene.get(a).unwrap().bbox());
    assert_eq!(top.z_index(), 1);
}
