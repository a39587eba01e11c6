//! Behavioural tests for the particle field, driven through the public API only.
#[cfg(test)]
#[expect(clippy::float_cmp, reason = "Tests aren't so strict")]
mod field {
    use constellation::canvas::{Canvas, Colour, Glow, Stroke};
    use constellation::field::{Config, ParticleField};
    use constellation::particle::Particle;
    use glam::DVec2;
    use rand::SeedableRng as _;

    /// Everything that was drawn in a single tick.
    #[derive(Default)]
    struct RecordingCanvas {
        size: DVec2,
        clears: usize,
        lines: Vec<(DVec2, DVec2, Stroke)>,
        circles: Vec<(DVec2, f64, Colour, Option<Glow>)>,
    }

    impl RecordingCanvas {
        fn new(width: f64, height: f64) -> Self {
            Self {
                size: DVec2::new(width, height),
                ..Self::default()
            }
        }

        fn lines_coloured(&self, rgb: (f32, f32, f32)) -> Vec<Stroke> {
            self.lines
                .iter()
                .filter(|(_, _, stroke)| {
                    (stroke.colour.0, stroke.colour.1, stroke.colour.2) == rgb
                })
                .map(|(_, _, stroke)| *stroke)
                .collect()
        }
    }

    impl Canvas for RecordingCanvas {
        fn dimensions(&self) -> DVec2 {
            self.size
        }

        fn clear(&mut self) {
            self.clears += 1;
            self.lines.clear();
            self.circles.clear();
        }

        fn stroke_line(&mut self, from: DVec2, to: DVec2, stroke: Stroke) {
            self.lines.push((from, to, stroke));
        }

        fn fill_circle(&mut self, centre: DVec2, radius: f64, colour: Colour, glow: Option<Glow>) {
            self.circles.push((centre, radius, colour, glow));
        }
    }

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(1234)
    }

    fn still_particle(x: f64, y: f64, bounds: DVec2) -> Particle {
        Particle::new(DVec2::new(x, y), DVec2::new(0.3, -0.6), 0.0, 1.0, bounds)
    }

    fn empty_field(width: f64, height: f64) -> ParticleField {
        let mut config = Config::default();
        config.density = f64::MAX;
        let mut field = ParticleField::new(config);
        field.initialize(width, height, &mut rng());
        assert!(field.particles().is_empty());
        field
    }

    #[test]
    fn population_is_area_over_density() {
        for (width, height) in [
            (0.0, 0.0),
            (100.0, 100.0),
            (122.0, 122.0),
            (123.0, 123.0),
            (1920.0, 1080.0),
            (3840.0, 2160.0),
            (10_000.0, 10_000.0),
        ] {
            let mut field = ParticleField::new(Config::default());
            field.initialize(width, height, &mut rng());
            #[expect(
                clippy::as_conversions,
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "Tests aren't so strict"
            )]
            let expected = (width * height / constellation::field::DENSITY).floor() as usize;
            assert_eq!(field.particles().len(), expected, "{width}x{height}");
        }
    }

    #[test]
    fn fewer_than_one_particle_is_zero() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(100.0, 100.0, &mut rng());
        assert!(field.particles().is_empty());

        let mut canvas = RecordingCanvas::new(100.0, 100.0);
        field.tick(&mut canvas);
        assert_eq!(canvas.clears, 1);
        assert!(canvas.circles.is_empty());
        assert!(canvas.lines.is_empty());
    }

    #[test]
    fn particles_start_on_the_surface() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(1920.0, 1080.0, &mut rng());
        for particle in field.particles() {
            assert!((0.0..1920.0).contains(&particle.position.x));
            assert!((0.0..1080.0).contains(&particle.position.y));
            assert!((-1.0..1.0).contains(&particle.direction.x));
            assert!((-1.0..1.0).contains(&particle.direction.y));
            assert!((0.2..0.7).contains(&particle.speed));
            assert!((0.5..2.5).contains(&particle.radius));
            assert_eq!(particle.bounds, DVec2::new(1920.0, 1080.0));
        }
    }

    #[test]
    fn particles_bounce_off_all_four_edges() {
        let bounds = DVec2::new(500.0, 400.0);
        let epsilon = 0.1;
        let speed = 1.0;
        let cases = [
            (DVec2::new(bounds.x - epsilon, 200.0), DVec2::new(1.0, 0.0)),
            (DVec2::new(epsilon, 200.0), DVec2::new(-1.0, 0.0)),
            (DVec2::new(250.0, bounds.y - epsilon), DVec2::new(0.0, 1.0)),
            (DVec2::new(250.0, epsilon), DVec2::new(0.0, -1.0)),
        ];

        for (position, direction) in cases {
            let mut field = empty_field(bounds.x, bounds.y);
            field.push(Particle::new(position, direction, speed, 1.0, bounds));
            field.tick(&mut RecordingCanvas::new(bounds.x, bounds.y));

            let particle = field.particles()[0];
            assert_eq!(particle.direction, -direction, "starting at {position}");
        }
    }

    #[test]
    fn particles_in_the_middle_keep_going() {
        let bounds = DVec2::new(500.0, 400.0);
        let mut field = empty_field(bounds.x, bounds.y);
        let direction = DVec2::new(0.5, -0.5);
        field.push(Particle::new(
            DVec2::new(250.0, 200.0),
            direction,
            0.4,
            1.0,
            bounds,
        ));
        field.tick(&mut RecordingCanvas::new(bounds.x, bounds.y));

        let particle = field.particles()[0];
        assert_eq!(particle.direction, direction);
        assert_eq!(particle.position, DVec2::new(250.2, 199.8));
    }

    #[test]
    fn pointer_push_falls_off_linearly() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let pointer = DVec2::new(500.0, 500.0);
        let config = Config::default();
        let radius = config.influence_radius;

        for distance in [0.5, 10.0, 75.0, 149.0] {
            for angle in [0.0, 1.0, 2.5, -2.0] {
                let start = pointer + DVec2::from_angle(angle) * distance;
                let mut field = empty_field(bounds.x, bounds.y);
                field.push(still_particle(start.x, start.y, bounds));
                field.set_pointer(Some(pointer));
                field.tick(&mut RecordingCanvas::new(bounds.x, bounds.y));

                let moved = field.particles()[0].position - start;
                let expected = (radius - distance) / radius * config.push_strength;
                assert!(
                    (moved.length() - expected).abs() < 1e-9,
                    "distance {distance}, angle {angle}: moved {} expected {expected}",
                    moved.length()
                );
                assert!(
                    field.particles()[0].position.distance(pointer) > distance,
                    "pushed away from the pointer"
                );
            }
        }
    }

    #[test]
    fn no_push_at_or_beyond_the_influence_radius() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let radius = Config::default().influence_radius;

        for distance in [radius, radius + 0.01, radius * 3.0] {
            let mut field = empty_field(bounds.x, bounds.y);
            field.push(still_particle(100.0 + distance, 500.0, bounds));
            field.set_pointer(Some(DVec2::new(100.0, 500.0)));
            field.tick(&mut RecordingCanvas::new(bounds.x, bounds.y));
            assert_eq!(
                field.particles()[0].position,
                DVec2::new(100.0 + distance, 500.0)
            );
        }
    }

    #[test]
    fn particles_are_linked_only_when_close() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let config = Config::default();
        let link = config.colours.link;

        let mut previous_opacity = f32::INFINITY;
        for distance in [0.0, 1.0, 30.0, 60.0, 119.0, 119.99] {
            let mut field = empty_field(bounds.x, bounds.y);
            field.push(still_particle(300.0, 300.0, bounds));
            field.push(still_particle(300.0 + distance, 300.0, bounds));
            let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
            field.tick(&mut canvas);

            let lines = canvas.lines_coloured(link);
            assert_eq!(lines.len(), 1, "distance {distance}");

            #[expect(
                clippy::as_conversions,
                clippy::cast_possible_truncation,
                reason = "Tests aren't so strict"
            )]
            let expected =
                ((1.0 - distance / config.link_radius) * config.link_opacity) as f32;
            let opacity = lines[0].colour.3;
            assert!((opacity - expected).abs() < 1e-6, "distance {distance}");
            assert!(opacity < previous_opacity);
            assert_eq!(lines[0].width, config.link_width);
            previous_opacity = opacity;
        }

        for distance in [config.link_radius, 120.01, 500.0] {
            let mut field = empty_field(bounds.x, bounds.y);
            field.push(still_particle(300.0, 300.0, bounds));
            field.push(still_particle(300.0 + distance, 300.0, bounds));
            let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
            field.tick(&mut canvas);
            assert!(canvas.lines.is_empty(), "distance {distance}");
        }
    }

    #[test]
    fn each_pair_is_linked_once() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let mut field = empty_field(bounds.x, bounds.y);
        for x in [100.0, 110.0, 120.0, 130.0] {
            field.push(still_particle(x, 100.0, bounds));
        }
        let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
        field.tick(&mut canvas);

        assert_eq!(canvas.lines.len(), 6);
    }

    #[test]
    fn absent_pointer_neither_pushes_nor_links() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(1200.0, 900.0, &mut rng());
        field.set_pointer(Some(DVec2::new(600.0, 450.0)));
        field.set_pointer(None);

        let expected: Vec<DVec2> = field
            .particles()
            .iter()
            .map(|particle| {
                let mut moved = *particle;
                moved.update(&constellation::pointer::PointerState::default());
                moved.position
            })
            .collect();

        let mut canvas = RecordingCanvas::new(1200.0, 900.0);
        field.tick(&mut canvas);

        let positions: Vec<DVec2> = field
            .particles()
            .iter()
            .map(|particle| particle.position)
            .collect();
        assert_eq!(positions, expected);
        assert!(canvas
            .lines_coloured(field.config().colours.pointer_link)
            .is_empty());
    }

    #[test]
    fn present_pointer_links_to_nearby_particles() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let mut field = empty_field(bounds.x, bounds.y);
        field.push(still_particle(100.0, 100.0, bounds));
        field.push(still_particle(900.0, 900.0, bounds));
        field.set_pointer(Some(DVec2::new(150.0, 100.0)));

        let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
        field.tick(&mut canvas);

        let pointer_links = canvas.lines_coloured(field.config().colours.pointer_link);
        assert_eq!(pointer_links.len(), 1);
        assert_eq!(pointer_links[0].width, field.config().pointer_link_width);
    }

    #[test]
    fn pointer_link_opacity_fades_with_distance_after_the_push() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let pointer = DVec2::new(500.0, 500.0);
        let config = Config::default();
        let radius = config.influence_radius;

        let mut previous_opacity = f32::INFINITY;
        for distance in [0.5, 20.0, 76.0, 140.0, 149.0] {
            let mut field = empty_field(bounds.x, bounds.y);
            field.push(still_particle(pointer.x + distance, pointer.y, bounds));
            field.set_pointer(Some(pointer));
            let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
            field.tick(&mut canvas);

            let pushed = field.particles()[0].position;
            let pushed_distance = pushed.distance(pointer);
            assert!(pushed_distance > distance);

            assert_eq!(canvas.lines.len(), 1, "distance {distance}");
            let (from, to, stroke) = canvas.lines[0];
            assert_eq!(from, pointer);
            assert_eq!(to, pushed);
            assert_eq!(
                (stroke.colour.0, stroke.colour.1, stroke.colour.2),
                (0.0, 1.0, 136.0 / 255.0)
            );

            #[expect(
                clippy::as_conversions,
                clippy::cast_possible_truncation,
                reason = "Tests aren't so strict"
            )]
            let expected =
                ((1.0 - pushed_distance / radius) * config.pointer_link_opacity) as f32;
            assert!(
                (stroke.colour.3 - expected).abs() < 1e-6,
                "distance {distance}: opacity {} expected {expected}",
                stroke.colour.3
            );
            assert!(stroke.colour.3 < previous_opacity);
            previous_opacity = stroke.colour.3;
        }
    }

    #[test]
    fn no_pointer_link_at_the_influence_radius() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let radius = Config::default().influence_radius;
        let mut field = empty_field(bounds.x, bounds.y);
        field.push(still_particle(100.0 + radius, 500.0, bounds));
        field.set_pointer(Some(DVec2::new(100.0, 500.0)));

        let mut canvas = RecordingCanvas::new(bounds.x, bounds.y);
        field.tick(&mut canvas);

        assert_eq!(field.particles()[0].position, DVec2::new(100.0 + radius, 500.0));
        assert!(canvas.lines.is_empty());
    }

    #[test]
    fn particles_are_drawn_where_they_moved_to() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(1200.0, 900.0, &mut rng());
        field.set_pointer(Some(DVec2::new(600.0, 450.0)));
        let before: Vec<DVec2> = field
            .particles()
            .iter()
            .map(|particle| particle.position)
            .collect();

        let mut canvas = RecordingCanvas::new(1200.0, 900.0);
        field.tick(&mut canvas);

        assert_eq!(canvas.circles.len(), field.particles().len() * 2);
        for ((pair, particle), start) in canvas
            .circles
            .chunks(2)
            .zip(field.particles())
            .zip(&before)
        {
            assert_eq!(pair[0].0, particle.position);
            assert_eq!(pair[1].0, particle.position);
            assert_eq!(pair[0].1, particle.radius);
            assert_ne!(pair[0].0, *start);
        }
    }

    #[test]
    fn every_particle_is_drawn_with_and_without_a_glow() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(1200.0, 900.0, &mut rng());
        let mut canvas = RecordingCanvas::new(1200.0, 900.0);
        field.tick(&mut canvas);

        assert_eq!(canvas.circles.len(), field.particles().len() * 2);
        for pair in canvas.circles.chunks(2) {
            assert!(pair[0].3.is_none());
            assert!(pair[1].3.is_some());
            assert_eq!(pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn resizing_keeps_the_original_particles_and_bounds() {
        let mut field = ParticleField::new(Config::default());
        field.initialize(1500.0, 1000.0, &mut rng());
        let before = field.particles().to_vec();

        field.resize(400.0, 300.0);

        assert_eq!(field.surface_size(), DVec2::new(400.0, 300.0));
        assert_eq!(field.particles(), before.as_slice());
        for particle in field.particles() {
            assert_eq!(particle.bounds, DVec2::new(1500.0, 1000.0));
        }
    }

    #[test]
    fn particles_outside_a_shrunk_surface_bounce_off_their_old_edges() {
        let bounds = DVec2::new(1000.0, 1000.0);
        let mut field = empty_field(bounds.x, bounds.y);
        let direction = DVec2::new(1.0, 0.0);
        field.push(Particle::new(
            DVec2::new(600.0, 100.0),
            direction,
            0.5,
            1.0,
            bounds,
        ));
        field.resize(500.0, 500.0);
        field.tick(&mut RecordingCanvas::new(500.0, 500.0));

        let particle = field.particles()[0];
        assert_eq!(particle.direction, direction);
        assert_eq!(particle.position.x, 600.5);
    }

    #[tokio::test]
    async fn animation_draws_onto_a_terminal_surface() {
        let mut config = constellation::config::Config::default();
        config.frame_rate = 1000;
        let surface = constellation::surface::Surface::new(80, 24, config.scale);
        let animation =
            constellation::animation::Animation::attach(Some(surface), &config, &mut rng())
                .unwrap();
        assert!(!animation.field().particles().is_empty());

        let (protocol_tx, protocol_rx) = tokio::sync::broadcast::channel(16);
        let (frames_tx, mut frames_rx) = tokio::sync::mpsc::channel(4);
        let handle = tokio::spawn(animation.run(protocol_rx, frames_tx));

        let frame = frames_rx.recv().await.unwrap();
        protocol_tx
            .send(constellation::run::Protocol::End)
            .unwrap();
        while frames_rx.recv().await.is_some() {}
        handle.await.unwrap().unwrap();

        let mut terminal_frame = frame.to_termwiz();
        let drawn = terminal_frame
            .screen_cells()
            .iter()
            .flat_map(|line| line.iter())
            .filter(|cell| cell.str() != " ")
            .count();
        assert!(drawn > 0);
    }
}
