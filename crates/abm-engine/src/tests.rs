use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use abm_core::{AgentIndex, AgentRef, AttrValue, Cycle, Point};
use abm_schema::{keys, Species, SpeciesBuilder, VarDef};

use crate::{
    Agent, Architecture, AttrMap, MetaPopulation, NoopArchitecture, Population, PopulationEvent,
    PopulationListener, PopulationPath, Scope,
};

fn scope_at(cycle: u64) -> Scope {
    let mut scope = Scope::new();
    scope.set_cycle(Cycle(cycle));
    scope
}

fn simple(name: &str) -> Arc<Species> {
    SpeciesBuilder::new(name).build()
}

fn map(pairs: &[(&str, AttrValue)]) -> AttrMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), v.clone()))
        .collect()
}

/// Records every event it sees behind a shared handle.
struct Recorder(Arc<Mutex<Vec<PopulationEvent>>>);

impl Recorder {
    fn install(pop: &mut Population) -> Arc<Mutex<Vec<PopulationEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        pop.add_listener(Box::new(Recorder(events.clone())));
        events
    }
}

impl PopulationListener for Recorder {
    fn on_population_event(&mut self, event: &PopulationEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// Counts architecture invocations.
#[derive(Default)]
struct CountingArch {
    inits: AtomicUsize,
    steps: AtomicUsize,
    pre_steps: AtomicUsize,
}

impl Architecture for CountingArch {
    fn init_agent(&self, _scope: &mut Scope, _agent: &mut Agent) -> bool {
        self.inits.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn step_agent(&self, _scope: &mut Scope, _agent: &mut Agent) -> bool {
        self.steps.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn pre_step_population(&self, _scope: &mut Scope, _species: &Species) {
        self.pre_steps.fetch_add(1, Ordering::Relaxed);
    }
}

mod creation {
    use super::*;

    #[test]
    fn indices_unique_and_never_reused() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let first = pop.create_agents(&mut scope, &NoopArchitecture, 3, &[], false).unwrap();
        assert_eq!(first, vec![AgentIndex(0), AgentIndex(1), AgentIndex(2)]);

        pop.kill_agent(&mut scope, &NoopArchitecture, AgentIndex(1)).unwrap();
        let second = pop.create_agents(&mut scope, &NoopArchitecture, 2, &[], false).unwrap();
        assert_eq!(second, vec![AgentIndex(3), AgentIndex(4)]);
        assert_eq!(pop.len(), 4);
    }

    #[test]
    fn shape_wins_over_location() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let init = map(&[
            (keys::SHAPE, AttrValue::Point(Point::new(1.0, 2.0))),
            (keys::LOCATION, AttrValue::Point(Point::new(9.0, 9.0))),
        ]);
        let ix = pop
            .create_agents(&mut scope, &NoopArchitecture, 1, &[init], false)
            .unwrap()[0];
        let agent = pop.get(ix).unwrap();
        assert_eq!(agent.location().unwrap(), Point::new(1.0, 2.0));
    }

    #[test]
    fn location_applies_without_shape() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let init = map(&[(keys::LOCATION, AttrValue::Point(Point::new(3.0, 4.0)))]);
        let ix = pop
            .create_agents(&mut scope, &NoopArchitecture, 1, &[init], false)
            .unwrap()[0];
        assert_eq!(pop.get(ix).unwrap().location().unwrap(), Point::new(3.0, 4.0));
    }

    #[test]
    fn undeclared_values_become_ad_hoc_attrs() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let init = map(&[("mood", AttrValue::Str("fine".into()))]);
        let ix = pop
            .create_agents(&mut scope, &NoopArchitecture, 1, &[init], false)
            .unwrap()[0];
        assert_eq!(
            pop.get(ix).unwrap().get_attr("mood"),
            Some(&AttrValue::Str("fine".into()))
        );
    }

    #[test]
    fn explicit_value_beats_arch_beats_default() {
        struct SevenArch;
        impl Architecture for SevenArch {
            fn init_value(&self, _: &mut Scope, _: &Agent, var: &VarDef) -> Option<AttrValue> {
                (var.name == "energy").then_some(AttrValue::Int(7))
            }
        }
        let species = SpeciesBuilder::new("ant")
            .var(VarDef::new("energy").with_default(5i64))
            .var(VarDef::new("age").with_default(1i64))
            .var(VarDef::new("size").with_default(2i64))
            .build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        let init = map(&[("energy", AttrValue::Int(42))]);
        let ix = pop.create_agents(&mut scope, &SevenArch, 1, &[init], false).unwrap()[0];
        let agent = pop.get(ix).unwrap();
        // Explicit map value wins over the architecture.
        assert_eq!(agent.get_attr("energy"), Some(&AttrValue::Int(42)));
        // Architecture supplied nothing for these, so defaults apply.
        assert_eq!(agent.get_attr("age"), Some(&AttrValue::Int(1)));
        assert_eq!(agent.get_attr("size"), Some(&AttrValue::Int(2)));
    }

    #[test]
    fn create_at_duplicate_index_fails_fast() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        pop.create_agent_at(&mut scope, &NoopArchitecture, AgentIndex(4), None, true).unwrap();
        let err = pop
            .create_agent_at(&mut scope, &NoopArchitecture, AgentIndex(4), None, true)
            .unwrap_err();
        assert!(matches!(err, abm_core::AbmError::DuplicateIndex { .. }));
    }

    #[test]
    fn explicit_index_advances_allocator() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        pop.create_agent_at(&mut scope, &NoopArchitecture, AgentIndex(10), None, true).unwrap();
        let next = pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], false).unwrap();
        assert_eq!(next, vec![AgentIndex(11)]);
    }

    #[test]
    fn get_or_create_reuses_live_agent() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], false).unwrap()[0];
        assert_eq!(pop.get_or_create_agent(&mut scope, &NoopArchitecture, ix).unwrap(), ix);
        assert_eq!(pop.len(), 1);

        let made = pop
            .get_or_create_agent(&mut scope, &NoopArchitecture, AgentIndex(7))
            .unwrap();
        assert_eq!(made, AgentIndex(7));
        assert_eq!(pop.len(), 2);
    }

    #[test]
    fn restored_agents_skip_init_behavior() {
        let arch = CountingArch::default();
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &arch, 1, &[], true).unwrap()[0];
        assert!(!pop.get(ix).unwrap().is_scheduled());
        pop.step(&mut scope, &arch).unwrap();
        assert_eq!(arch.inits.load(Ordering::Relaxed), 0);
        assert_eq!(arch.steps.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn batch_fires_exactly_one_event() {
        let mut pop = Population::new(simple("ant"), None);
        let events = Recorder::install(&mut pop);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &NoopArchitecture, 3, &[], false).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            PopulationEvent::AgentsAdded { species, indices } => {
                assert_eq!(species, "ant");
                assert_eq!(indices.len(), 3);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn post_creation_hook_short_circuits() {
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        let mut visited = Vec::new();
        let mut post = |_: &mut Scope, agent: &mut Agent| {
            visited.push(agent.index());
            agent.index() != AgentIndex(1)
        };
        pop.create_agents_with(&mut scope, &NoopArchitecture, 4, &[], false, &mut post)
            .unwrap();
        assert_eq!(visited, vec![AgentIndex(0), AgentIndex(1)]);
        assert_eq!(pop.len(), 4);
    }
}

mod lifecycle {
    use super::*;

    #[test]
    fn die_twice_equals_die_once() {
        let mut scope = scope_at(0);
        let mut agent = Agent::new(simple("ant"), AgentIndex(0), None);
        agent.die(&mut scope, &NoopArchitecture);
        assert!(agent.dead());
        agent.die(&mut scope, &NoopArchitecture);
        assert!(agent.dead());
        assert_eq!(scope.deaths(), 1);
    }

    #[test]
    fn dead_flag_is_monotonic_through_step() {
        let mut scope = scope_at(0);
        let mut agent = Agent::new(simple("ant"), AgentIndex(0), None);
        agent.dispose(&mut scope);
        assert!(agent.dead());
        assert!(!agent.step(&mut scope, &NoopArchitecture, &[]));
        assert!(agent.dead());
    }

    #[test]
    fn dispose_flushes_buffered_output() {
        let mut scope = scope_at(0);
        let mut agent = Agent::new(simple("ant"), AgentIndex(0), None);
        let handle = agent.as_ref();
        scope.buffer_output(&handle, "hello");
        scope.buffer_output(&handle, "goodbye");
        assert_eq!(scope.buffered(&handle), 2);

        agent.dispose(&mut scope);
        assert_eq!(scope.buffered(&handle), 0);
        assert_eq!(scope.drain_output(), vec!["hello".to_owned(), "goodbye".to_owned()]);
    }

    #[test]
    fn death_during_step_sweeps_agent() {
        struct DieArch;
        impl Architecture for DieArch {
            fn step_agent(&self, scope: &mut Scope, agent: &mut Agent) -> bool {
                agent.die(scope, self);
                false
            }
        }
        let mut pop = Population::new(simple("ant"), None);
        let events = Recorder::install(&mut pop);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &DieArch, 2, &[], false).unwrap();
        pop.step(&mut scope, &DieArch).unwrap();

        assert_eq!(pop.len(), 0);
        assert_eq!(scope.deaths(), 2);
        let events = events.lock().unwrap();
        assert!(matches!(
            events.last(),
            Some(PopulationEvent::AgentsRemoved { indices, .. }) if indices.len() == 2
        ));
    }

    #[test]
    fn kill_members_clears_and_fires_once() {
        let mut pop = Population::new(simple("ant"), None);
        let events = Recorder::install(&mut pop);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &NoopArchitecture, 5, &[], false).unwrap();
        pop.kill_members(&mut scope, &NoopArchitecture);

        assert!(pop.is_empty());
        assert_eq!(scope.deaths(), 5);
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2); // one AgentsAdded, one Cleared
        assert!(matches!(events[1], PopulationEvent::Cleared { .. }));
    }
}

mod stepping {
    use super::*;

    #[test]
    fn frequency_gates_cycles() {
        let arch = CountingArch::default();
        let species = SpeciesBuilder::new("slow").frequency(3).build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &arch, 1, &[], true).unwrap();

        for cycle in 0..7 {
            scope.set_cycle(Cycle(cycle));
            assert!(pop.step(&mut scope, &arch).unwrap());
        }
        // Cycles 0, 3, 6 pass the gate.
        assert_eq!(arch.steps.load(Ordering::Relaxed), 3);
        assert_eq!(arch.pre_steps.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn frequency_zero_never_steps() {
        let arch = CountingArch::default();
        let species = SpeciesBuilder::new("frozen").frequency(0).build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &arch, 1, &[], true).unwrap();
        for cycle in 0..5 {
            scope.set_cycle(Cycle(cycle));
            assert!(pop.step(&mut scope, &arch).unwrap());
        }
        assert_eq!(arch.steps.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn update_vars_apply_in_dependency_order() {
        struct EnergyArch;
        impl Architecture for EnergyArch {
            fn update_value(&self, _: &mut Scope, agent: &Agent, var: &VarDef) -> Option<AttrValue> {
                if var.name != "energy" {
                    return None;
                }
                // Depends on `age` already holding this cycle's value.
                let age = agent.get_attr("age")?.as_int()?;
                Some(AttrValue::Int(age + 1))
            }
        }
        let species = SpeciesBuilder::new("ant")
            .var(VarDef::new("energy").updatable_with(["age"]))
            .var(VarDef::new("age").with_default(10i64).updatable())
            .build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &EnergyArch, 1, &[], true).unwrap()[0];
        pop.step(&mut scope, &EnergyArch).unwrap();

        let agent = pop.get(ix).unwrap();
        assert_eq!(agent.get_attr("age"), Some(&AttrValue::Int(10)));
        assert_eq!(agent.get_attr("energy"), Some(&AttrValue::Int(11)));
    }

    #[test]
    fn failing_step_skips_post_step() {
        #[derive(Default)]
        struct FailArch {
            posts: AtomicUsize,
        }
        impl Architecture for FailArch {
            fn step_agent(&self, _: &mut Scope, _: &mut Agent) -> bool {
                false
            }
            fn post_step(&self, _: &mut Scope, _: &mut Agent) {
                self.posts.fetch_add(1, Ordering::Relaxed);
            }
        }
        let arch = FailArch::default();
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &arch, 1, &[], true).unwrap();
        pop.step(&mut scope, &arch).unwrap();
        assert_eq!(arch.posts.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn scheduled_inits_drain_before_stepping() {
        let arch = CountingArch::default();
        let mut pop = Population::new(simple("ant"), None);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &arch, 2, &[], false).unwrap();
        assert!(pop.agents().iter().all(Agent::is_scheduled));

        pop.step(&mut scope, &arch).unwrap();
        assert_eq!(arch.inits.load(Ordering::Relaxed), 2);
        assert!(pop.agents().iter().all(|a| !a.is_scheduled()));

        pop.step(&mut scope, &arch).unwrap();
        // Init ran exactly once per agent.
        assert_eq!(arch.inits.load(Ordering::Relaxed), 2);
    }
}

mod mirror {
    use super::*;

    struct MirrorArch(Mutex<Vec<AgentRef>>);

    impl Architecture for MirrorArch {
        fn mirror_targets(&self, _: &mut Scope, _: &Species) -> Vec<AgentRef> {
            self.0.lock().unwrap().clone()
        }
    }

    #[test]
    fn reconciliation_tracks_target_set() {
        let targets = vec![
            AgentRef::new("prey", AgentIndex(0)),
            AgentRef::new("prey", AgentIndex(1)),
        ];
        let arch = MirrorArch(Mutex::new(targets.clone()));
        let species = SpeciesBuilder::new("shadow").mirror().build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);

        pop.step(&mut scope, &arch).unwrap();
        assert_eq!(pop.len(), 2);
        let tracked: Vec<&AgentRef> = pop
            .agents()
            .iter()
            .filter_map(|a| a.get_attr(keys::TARGET)?.as_agent())
            .collect();
        assert!(tracked.contains(&&targets[0]));
        assert!(tracked.contains(&&targets[1]));

        // One target disappears; its mirror is disposed next step.
        arch.0.lock().unwrap().truncate(1);
        scope.set_cycle(Cycle(1));
        pop.step(&mut scope, &arch).unwrap();
        assert_eq!(pop.len(), 1);
        assert_eq!(
            pop.agents()[0].get_attr(keys::TARGET).and_then(AttrValue::as_agent),
            Some(&targets[0])
        );
    }

    #[test]
    fn stable_target_set_is_a_fixpoint() {
        let arch = MirrorArch(Mutex::new(vec![AgentRef::new("prey", AgentIndex(3))]));
        let species = SpeciesBuilder::new("shadow").mirror().build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        for cycle in 0..3 {
            scope.set_cycle(Cycle(cycle));
            pop.step(&mut scope, &arch).unwrap();
            assert_eq!(pop.len(), 1);
        }
    }
}

mod hierarchy {
    use super::*;

    fn world_with_prey() -> Arc<Species> {
        let prey = SpeciesBuilder::new("prey").build();
        SpeciesBuilder::new("world").micro(prey).build()
    }

    #[test]
    fn container_var_creates_micro_population() {
        let mut pop = Population::new(world_with_prey(), None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], false).unwrap()[0];
        let world = pop.get(ix).unwrap();
        let prey = world.micro_population("prey").expect("micro population");
        assert_eq!(prey.host(), Some(&world.as_ref()));
        assert!(prey.is_empty());
    }

    #[test]
    fn step_recurses_into_micro_populations() {
        let arch = CountingArch::default();
        let mut pop = Population::new(world_with_prey(), None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &arch, 1, &[], true).unwrap()[0];
        pop.get_mut(ix)
            .unwrap()
            .micro_population_mut("prey")
            .unwrap()
            .create_agents(&mut scope, &arch, 3, &[], true)
            .unwrap();

        pop.step(&mut scope, &arch).unwrap();
        // 1 world agent + 3 prey agents.
        assert_eq!(arch.steps.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn dispose_cascades_into_micro_populations() {
        let mut pop = Population::new(world_with_prey(), None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], true).unwrap()[0];
        pop.get_mut(ix)
            .unwrap()
            .micro_population_mut("prey")
            .unwrap()
            .create_agents(&mut scope, &NoopArchitecture, 2, &[], true)
            .unwrap();

        pop.kill_members(&mut scope, &NoopArchitecture);
        // Only the host ran the death path; its nested agents are torn down
        // through dispose, which records no deaths.
        assert_eq!(scope.deaths(), 1);
        assert!(pop.is_empty());
    }

    #[test]
    fn extern_registry_resolves_through_the_hierarchy() {
        // root hosts "city"; city agent 0 hosts "prey".
        let prey = SpeciesBuilder::new("prey").build();
        let city = SpeciesBuilder::new("city").micro(prey).build();
        let root_species = SpeciesBuilder::new("root").micro(city).build();

        let mut pop = Population::new(root_species, None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], true).unwrap()[0];
        let root = pop.get_mut(ix).unwrap();
        root.micro_population_mut("city")
            .unwrap()
            .create_agents(&mut scope, &NoopArchitecture, 1, &[], true)
            .unwrap();

        let path = PopulationPath::new("prey").through("city", AgentIndex(0));
        root.register_extern("inner.prey", path);

        let root = pop.get(ix).unwrap();
        // No direct micro-population named "inner.prey"; extern resolution kicks in.
        let resolved = root.population_for(root, "inner.prey").expect("extern population");
        assert_eq!(resolved.species().name(), "prey");
        // Direct names still take precedence.
        let direct = root.population_for(root, "city").unwrap();
        assert_eq!(direct.species().name(), "city");
    }
}

mod grid {
    use super::*;

    #[test]
    fn grid_populates_row_major_with_cell_centers() {
        let species = SpeciesBuilder::new("cell").grid(2, 3).build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        pop.init(&mut scope, &NoopArchitecture).unwrap();

        assert_eq!(pop.len(), 6);
        let first = &pop.agents()[0];
        assert_eq!(first.get_attr(keys::GRID_X), Some(&AttrValue::Int(0)));
        assert_eq!(first.get_attr(keys::GRID_Y), Some(&AttrValue::Int(0)));
        assert_eq!(first.location().unwrap(), Point::new(0.5, 0.5));

        // Row-major: slot 4 is row 1, col 1.
        let middle = &pop.agents()[4];
        assert_eq!(middle.get_attr(keys::GRID_X), Some(&AttrValue::Int(1)));
        assert_eq!(middle.get_attr(keys::GRID_Y), Some(&AttrValue::Int(1)));
        assert_eq!(middle.location().unwrap(), Point::new(1.5, 1.5));
    }

    #[test]
    fn init_is_idempotent_for_populated_grids() {
        let species = SpeciesBuilder::new("cell").grid(2, 2).build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        pop.init(&mut scope, &NoopArchitecture).unwrap();
        pop.init(&mut scope, &NoopArchitecture).unwrap();
        assert_eq!(pop.len(), 4);
    }
}

mod meta {
    use super::*;

    fn populated(name: &str, n: usize) -> Population {
        let mut pop = Population::new(simple(name), None);
        let mut scope = scope_at(0);
        pop.create_agents(&mut scope, &NoopArchitecture, n, &[], true).unwrap();
        pop
    }

    #[test]
    fn iteration_concatenates_sources() {
        let a = populated("ant", 2);
        let b = populated("bee", 3);
        let meta = MetaPopulation::with_sources(vec![&a, &b]);
        assert_eq!(meta.len(), 5);
        let species: Vec<&str> = meta.iter().map(|ag| ag.species().name()).collect();
        assert_eq!(species, vec!["ant", "ant", "bee", "bee", "bee"]);
    }

    #[test]
    fn name_map_dedups_first_wins() {
        let a = populated("ant", 1);
        let a2 = populated("ant", 4);
        let meta = MetaPopulation::with_sources(vec![&a, &a2]);
        let named = meta.population_named("ant").unwrap();
        assert_eq!(named.len(), 1);
    }

    #[test]
    fn add_source_invalidates_name_cache() {
        let a = populated("ant", 1);
        let b = populated("bee", 1);
        let mut meta = MetaPopulation::new();
        meta.add_source(&a);
        assert!(meta.population_named("bee").is_none());
        meta.add_source(&b);
        assert!(meta.population_named("bee").is_some());
    }

    #[test]
    fn accept_excludes_the_caller() {
        let a = populated("ant", 3);
        let meta = MetaPopulation::with_sources(vec![&a]);
        let caller = a.agents()[1].as_ref();
        let others = meta.accept(&caller, |_| true);
        assert_eq!(others.len(), 2);
        assert!(others.iter().all(|ag| ag.as_ref() != caller));
    }
}

mod listeners {
    use super::*;

    #[test]
    fn remove_listener_stops_delivery() {
        let mut pop = Population::new(simple("ant"), None);
        let events = Arc::new(Mutex::new(Vec::new()));
        let id = pop.add_listener(Box::new(Recorder(events.clone())));
        let mut scope = scope_at(0);

        pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], false).unwrap();
        assert!(pop.remove_listener(id));
        assert!(!pop.remove_listener(id));
        pop.create_agents(&mut scope, &NoopArchitecture, 1, &[], false).unwrap();

        assert_eq!(events.lock().unwrap().len(), 1);
    }
}

mod scope {
    use super::*;

    #[test]
    fn fork_and_absorb_merge_state() {
        let mut scope = scope_at(5);
        let agent = AgentRef::new("ant", AgentIndex(0));

        let mut fork = scope.fork();
        assert_eq!(fork.cycle(), Cycle(5));
        fork.record_death();
        fork.report_error("boom");
        fork.buffer_output(&agent, "line");

        scope.absorb(fork);
        assert_eq!(scope.deaths(), 1);
        assert_eq!(scope.errors(), &["boom".to_owned()]);
        assert_eq!(scope.buffered(&agent), 1);
    }

    #[test]
    fn fork_interrupt_dies_with_the_fork() {
        let mut scope = scope_at(0);
        let mut fork = scope.fork();
        fork.interrupt();
        assert!(fork.is_interrupted());
        scope.absorb(fork);
        assert!(!scope.is_interrupted());
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn parallel_interrupt_stays_with_its_agent() {
        use abm_core::SimConfig;

        struct InterruptArch;
        impl Architecture for InterruptArch {
            fn update_value(&self, scope: &mut Scope, _: &Agent, _: &VarDef) -> Option<AttrValue> {
                scope.interrupt();
                None
            }
        }
        let species = SpeciesBuilder::new("ant")
            .var(VarDef::new("age").with_default(1i64).updatable())
            .concurrent()
            .build();
        let mut pop = Population::new(species, None);
        let mut scope = Scope::from_config(&SimConfig {
            total_cycles: 1,
            seed: 0,
            parallel_threshold: 2,
        });
        pop.create_agents(&mut scope, &InterruptArch, 4, &[], true).unwrap();
        pop.step(&mut scope, &InterruptArch).unwrap();

        // Each agent's interrupt aborted its own update phase and nothing
        // else: the scope comes out clean, exactly as on the sequential path.
        assert!(!scope.is_interrupted());
        assert!(pop.agents().iter().all(|a| a.get_attr("age").is_none()));
    }

    #[test]
    fn interrupt_aborts_update_phase() {
        struct InterruptArch;
        impl Architecture for InterruptArch {
            fn update_value(&self, scope: &mut Scope, _: &Agent, _: &VarDef) -> Option<AttrValue> {
                scope.interrupt();
                None
            }
        }
        let species = SpeciesBuilder::new("ant")
            .var(VarDef::new("age").with_default(1i64).updatable())
            .build();
        let mut pop = Population::new(species, None);
        let mut scope = scope_at(0);
        let ix = pop.create_agents(&mut scope, &InterruptArch, 1, &[], true).unwrap()[0];
        pop.step(&mut scope, &InterruptArch).unwrap();
        // The interrupted update phase aborted before the default applied.
        assert_eq!(pop.get(ix).unwrap().get_attr("age"), None);
    }
}
