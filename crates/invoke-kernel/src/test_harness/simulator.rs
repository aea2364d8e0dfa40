//! Invoke simulator
//!
//! Runs seeded random invoke walks and checks the pipeline's guarantees hold
//! for every one of them:
//! - Exactly the clean instances are recorded
//! - No record carries an ephemeral value
//! - The provider is never asked to plan an instance that failed earlier
//! - Every faulty instance reports exactly one error

use super::doubles::{provider_error, unavailable_factory, RecordingProvider};
use crate::configs::{ActionDecl, Body, Config, Expr, SourceRange};
use crate::context::WalkContext;
use crate::eval::ScopeEvaluator;
use crate::expander::{Expander, Expansion};
use crate::providers::{ActionSchema, DeferredReason, PlanActionResponse, ProviderRegistry};
use crate::walk::InvokeWalker;
use invoke_addrs::{AbsAction, AbsActionInstance, Action, InstanceKey, ModuleInstance, Provider};
use invoke_value::{AttributeSchema, BlockSchema, Mark, Type, Value};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::sync::Arc;

const ACTION_TYPE: &str = "webhook_notify";

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Number of walks
    pub scenarios: u64,
    /// Upper bound on instances per action
    pub max_instances: usize,
    /// Probability that an instance is given a fault
    pub fault_rate: f64,
    /// Probability that the provider cannot be started
    pub unavailable_rate: f64,
    /// Instances planned at once
    pub parallelism: usize,
    /// Stop at the first violation
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            scenarios: 200,
            max_instances: 8,
            fault_rate: 0.3,
            unavailable_rate: 0.1,
            parallelism: 4,
            stop_on_first_violation: false,
        }
    }
}

/// Fault injected into one instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// Configuration carries an ephemeral value
    Ephemeral,
    /// Configuration is not wholly known
    Unknown,
    /// Provider defers the action
    Deferral,
    /// Provider answers with an error
    ProviderError,
}

impl Fault {
    /// Whether the pipeline stops before calling the provider
    #[must_use]
    pub fn is_pre_dispatch(self) -> bool {
        matches!(self, Self::Ephemeral | Self::Unknown)
    }
}

/// A broken guarantee
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Recorded invocations differ from clean instances
    RecordCountMismatch {
        /// Scenario index
        scenario: u64,
        /// Clean instances
        expected: usize,
        /// Records appended
        actual: usize,
    },
    /// A record still holds an ephemeral value
    EphemeralRecorded {
        /// Scenario index
        scenario: u64,
        /// Recorded instance
        addr: String,
    },
    /// A faulty instance was recorded
    FaultyInstanceRecorded {
        /// Scenario index
        scenario: u64,
        /// Recorded instance
        addr: String,
    },
    /// The provider planned an instance that had already failed
    ProviderCalledAfterFailure {
        /// Scenario index
        scenario: u64,
        /// Message sent to the provider
        message: String,
    },
    /// Total errors differ from faulty instances
    ErrorCountMismatch {
        /// Scenario index
        scenario: u64,
        /// Faulty instances
        expected: usize,
        /// Errors reported
        actual: usize,
    },
    /// A faulty instance did not report exactly one error of its own
    InstanceErrorMismatch {
        /// Scenario index
        scenario: u64,
        /// Instance address
        addr: String,
        /// Errors naming the instance
        errors: usize,
    },
}

/// Simulation counters
#[derive(Debug, Clone, Default)]
pub struct SimulatorStats {
    /// Walks run
    pub scenarios_run: u64,
    /// Walks whose provider could not start
    pub unavailable_scenarios: u64,
    /// Instances planned
    pub instances: u64,
    /// Instances recorded
    pub committed: u64,
    /// Instances that failed
    pub failed: u64,
    /// Plan requests the provider received
    pub provider_calls: u64,
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration used
    pub config: SimulatorConfig,
    /// Counters
    pub stats: SimulatorStats,
    /// Broken guarantees
    pub violations: Vec<Violation>,
}

impl SimulatorReport {
    /// Whether every guarantee held
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "=== Invoke Simulator Report ===\n");
        let _ = writeln!(report, "Seed: {}", self.config.seed);
        let _ = writeln!(report, "Scenarios: {}", self.stats.scenarios_run);
        let _ = writeln!(report, "Provider Unavailable: {}", self.stats.unavailable_scenarios);
        let _ = writeln!(report, "Instances: {}", self.stats.instances);
        let _ = writeln!(report, "Committed: {}", self.stats.committed);
        let _ = writeln!(report, "Failed: {}", self.stats.failed);
        let _ = writeln!(report, "Provider Calls: {}", self.stats.provider_calls);
        let _ = writeln!(report, "Violations: {}", self.violations.len());

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                let _ = writeln!(report, "{}. {v:?}", i + 1);
            }
        }

        let _ = writeln!(report, "\n=== Result: {} ===", if self.passed() { "PASS" } else { "FAIL" });
        report
    }
}

/// One generated instance
#[derive(Debug, Clone)]
struct PlannedInstance {
    addr: AbsActionInstance,
    message: String,
    fault: Option<Fault>,
}

/// One generated walk
#[derive(Debug)]
struct Scenario {
    config: Arc<Config>,
    action: AbsAction,
    expansion: Expansion,
    instances: Vec<PlannedInstance>,
    unavailable: bool,
}

impl Scenario {
    fn generate(rng: &mut StdRng, index: u64, sim: &SimulatorConfig) -> Self {
        let module = if rng.random_bool(0.3) {
            ModuleInstance::root().child("app", InstanceKey::NoKey)
        } else {
            ModuleInstance::root()
        };
        let action = Action::new(ACTION_TYPE, format!("notify_{index}")).absolute(&module);
        let count = rng.random_range(0..=sim.max_instances);
        let use_for_each = rng.random_bool(0.5);

        let mut instances = Vec::with_capacity(count);
        let mut items = BTreeMap::new();
        for i in 0..count {
            let fault = if rng.random_bool(sim.fault_rate) {
                let choices: &[Fault] = if use_for_each {
                    &[Fault::Ephemeral, Fault::Unknown, Fault::Deferral, Fault::ProviderError]
                } else {
                    &[Fault::Deferral, Fault::ProviderError]
                };
                Some(choices[rng.random_range(0..choices.len())])
            } else {
                None
            };

            if use_for_each {
                let key = format!("k{i}");
                let message = format!("{index}-{key}");
                let value = match fault {
                    Some(Fault::Ephemeral) => Value::string(message.clone()).with_mark(Mark::Ephemeral),
                    Some(Fault::Unknown) => Value::unknown(Type::String),
                    _ => Value::string(message.clone()),
                };
                items.insert(key.clone(), value);
                instances.push(PlannedInstance {
                    addr: action.instance(InstanceKey::Str(key)),
                    message,
                    fault,
                });
            } else {
                let i = i64::try_from(i).unwrap_or(i64::MAX);
                instances.push(PlannedInstance {
                    addr: action.instance(InstanceKey::Int(i)),
                    message: format!("{index}-n{i}"),
                    fault,
                });
            }
        }

        let (expansion, message_expr) = if use_for_each {
            (Expansion::ForEach(items), Expr::EachValue)
        } else {
            (
                Expansion::Count(count),
                Expr::Concat(vec![Expr::string(format!("{index}-n")), Expr::CountIndex]),
            )
        };

        let range = SourceRange::new("main.tf", (1, 1), (1, 40));
        let body = Body::new(range.clone()).with_attribute("message", message_expr, range.clone());
        let mut config = Config::new();
        config.add_action(
            &module.module(),
            ActionDecl::new(ACTION_TYPE, format!("notify_{index}"), range).with_config(body),
        );

        Self {
            config: Arc::new(config),
            action,
            expansion,
            instances,
            unavailable: rng.random_bool(sim.unavailable_rate),
        }
    }

    fn faults_by_message(&self) -> HashMap<String, Fault> {
        self.instances
            .iter()
            .filter_map(|inst| inst.fault.map(|f| (inst.message.clone(), f)))
            .collect()
    }

    fn expected_records(&self) -> usize {
        if self.unavailable {
            return 0;
        }
        self.instances.iter().filter(|inst| inst.fault.is_none()).count()
    }

    fn expected_errors(&self) -> usize {
        if self.unavailable {
            return self.instances.len();
        }
        self.instances.iter().filter(|inst| inst.fault.is_some()).count()
    }
}

fn schema() -> ActionSchema {
    ActionSchema::new(
        BlockSchema::new()
            .with_attribute("message", AttributeSchema::required(Type::String))
            .with_attribute("token", AttributeSchema::optional(Type::String).write_only()),
    )
}

/// Run one scenario and check its outcome
async fn run_scenario(
    index: u64,
    scenario: &Scenario,
    sim: &SimulatorConfig,
    stats: &mut SimulatorStats,
) -> Vec<Violation> {
    let faults = scenario.faults_by_message();
    let client = Arc::new(RecordingProvider::new(move |request| {
        let message = request
            .proposed_action_data
            .get_attr("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match faults.get(message) {
            Some(Fault::Deferral) => PlanActionResponse::deferred(DeferredReason::AbsentPrereq),
            Some(Fault::ProviderError) => provider_error("Webhook rejected", "Endpoint returned 400."),
            _ => PlanActionResponse::ok(),
        }
    }));

    let provider = Provider::new("webhook");
    let registry = ProviderRegistry::new();
    if scenario.unavailable {
        registry.install(provider.clone(), unavailable_factory("plugin exited during startup"));
    } else {
        registry.install_client(provider.clone(), client.clone());
    }
    registry.register_action_schema(&provider, ACTION_TYPE, schema());

    let expander = Expander::new();
    expander.set_action_expansion(scenario.action.clone(), scenario.expansion.clone());

    let ctx = WalkContext::new(
        Arc::new(expander),
        Arc::new(ScopeEvaluator::new()),
        Arc::new(registry),
    );
    let walker = InvokeWalker::new(Arc::clone(&scenario.config))
        .with_parallelism(sim.parallelism);
    let report = walker.walk(&ctx, &[scenario.action.clone().into()]).await;

    let records = report.changes.action_invocations();
    let calls = client.calls();
    stats.scenarios_run += 1;
    stats.unavailable_scenarios += u64::from(scenario.unavailable);
    stats.instances += scenario.instances.len() as u64;
    stats.committed += records.len() as u64;
    stats.failed += scenario.instances.len().saturating_sub(records.len()) as u64;
    stats.provider_calls += calls.len() as u64;

    let mut violations = Vec::new();

    let expected = scenario.expected_records();
    if records.len() != expected {
        violations.push(Violation::RecordCountMismatch {
            scenario: index,
            expected,
            actual: records.len(),
        });
    }

    let faulty: HashMap<&AbsActionInstance, Fault> = scenario
        .instances
        .iter()
        .filter_map(|inst| inst.fault.map(|f| (&inst.addr, f)))
        .collect();
    for record in &records {
        if !record
            .config_value()
            .paths_with_mark(|m| *m == Mark::Ephemeral)
            .is_empty()
            || record.config_value().has_mark(&Mark::Ephemeral)
        {
            violations.push(Violation::EphemeralRecorded {
                scenario: index,
                addr: record.addr().to_string(),
            });
        }
        if faulty.contains_key(record.addr()) {
            violations.push(Violation::FaultyInstanceRecorded {
                scenario: index,
                addr: record.addr().to_string(),
            });
        }
    }

    let pre_dispatch: Vec<&str> = scenario
        .instances
        .iter()
        .filter(|inst| inst.fault.is_some_and(Fault::is_pre_dispatch))
        .map(|inst| inst.message.as_str())
        .collect();
    for call in &calls {
        let message = call
            .proposed_action_data
            .get_attr("message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if pre_dispatch.contains(&message) {
            violations.push(Violation::ProviderCalledAfterFailure {
                scenario: index,
                message: message.to_string(),
            });
        }
    }

    let errors = report.diagnostics.error_count();
    let expected_errors = scenario.expected_errors();
    if errors != expected_errors {
        violations.push(Violation::ErrorCountMismatch {
            scenario: index,
            expected: expected_errors,
            actual: errors,
        });
    }

    for inst in &scenario.instances {
        let attributable = scenario.unavailable || inst.fault.is_some_and(|f| f != Fault::ProviderError);
        if !attributable {
            continue;
        }
        let addr = inst.addr.to_string();
        let own = report
            .diagnostics
            .errors()
            .filter(|d| d.address.as_deref() == Some(addr.as_str()))
            .count();
        if own != 1 {
            violations.push(Violation::InstanceErrorMismatch {
                scenario: index,
                addr,
                errors: own,
            });
        }
    }

    violations
}

/// Run the invoke simulator
pub async fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut stats = SimulatorStats::default();
    let mut violations = Vec::new();

    for index in 0..config.scenarios {
        let scenario = Scenario::generate(&mut rng, index, &config);
        let found = run_scenario(index, &scenario, &config, &mut stats).await;
        let stop = config.stop_on_first_violation && !found.is_empty();
        violations.extend(found);
        if stop {
            break;
        }
    }

    tracing::info!(
        scenarios = stats.scenarios_run,
        violations = violations.len(),
        "simulation finished"
    );

    SimulatorReport {
        config,
        stats,
        violations,
    }
}
