//! Support-vector classification binding
//!
//! The binary solver handles two classes at a time, so multi-class problems
//! are decided one-vs-one: every class pair gets its own machine and each
//! machine casts one vote per row. A solved machine borrows its training
//! rows and parameters, so each pair owns both in a self-referencing cell.

use crate::error::{NotebookError, Result};
use crate::training::config::Kernel;
use crate::training::features::to_dense;
use ndarray::{Array2, Axis};
use self_cell::self_cell;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::svm::svc::{SVCParameters, SVC};
use smartcore::svm::Kernels;
use tracing::debug;

const DEFAULT_PENALTY: f64 = 1.0;

type Parameters = SVCParameters<f64, i32, DenseMatrix<f64>, Vec<i32>>;
type Machine<'a> = SVC<'a, f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// One pair of classes, the rows belonging to either, and the solver settings
struct PairProblem {
    positive: i32,
    negative: i32,
    x: DenseMatrix<f64>,
    y: Vec<i32>,
    parameters: Parameters,
}

self_cell!(
    struct PairMachine {
        owner: PairProblem,

        #[covariant]
        dependent: Machine,
    }
);

pub struct SvmClassifier {
    machines: Vec<PairMachine>,
    n_classes: usize,
    kernel: Kernel,
    penalty: f64,
}

fn is_positive<T: PartialOrd + Default>(v: &T) -> bool {
    *v > T::default()
}

fn parameters(kernel: Kernel, penalty: f64) -> Parameters {
    let params = SVCParameters::default().with_c(penalty);
    match kernel {
        Kernel::Linear => params.with_kernel(Kernels::linear()),
        Kernel::Rbf { gamma } => params.with_kernel(Kernels::rbf().with_gamma(gamma.unwrap_or(1.0))),
        Kernel::Polynomial { degree, gamma, coef0 } => params.with_kernel(
            Kernels::polynomial()
                .with_degree(degree)
                .with_gamma(gamma)
                .with_coef0(coef0),
        ),
        Kernel::Sigmoid { gamma, coef0 } => {
            params.with_kernel(Kernels::sigmoid().with_gamma(gamma).with_coef0(coef0))
        }
    }
}

impl SvmClassifier {
    /// Solve one machine per class pair
    pub fn fit(
        x: &Array2<f64>,
        y: &[i32],
        n_classes: usize,
        kernel: Option<Kernel>,
        penalty: Option<f64>,
    ) -> Result<Self> {
        if n_classes < 2 {
            return Err(NotebookError::Fit("svm needs at least two classes".to_string()));
        }
        // Resolve the default gamma now so prediction uses the fitted width
        let kernel = match kernel.unwrap_or(Kernel::Linear) {
            Kernel::Rbf { gamma: None } => Kernel::Rbf {
                gamma: Some(1.0 / x.ncols().max(1) as f64),
            },
            other => other,
        };
        let penalty = penalty.unwrap_or(DEFAULT_PENALTY);

        let mut machines = Vec::new();
        for a in 0..n_classes as i32 {
            for b in (a + 1)..n_classes as i32 {
                let rows: Vec<usize> = (0..y.len()).filter(|&i| y[i] == a || y[i] == b).collect();
                if rows.is_empty() {
                    continue;
                }
                let problem = PairProblem {
                    positive: a,
                    negative: b,
                    x: to_dense(&x.select(Axis(0), &rows))?,
                    y: rows.iter().map(|&i| if y[i] == a { 1 } else { -1 }).collect(),
                    parameters: parameters(kernel, penalty),
                };
                let machine = PairMachine::try_new(problem, |p| SVC::fit(&p.x, &p.y, &p.parameters))
                    .map_err(|e| NotebookError::Fit(format!("svm ({} vs {}): {}", a, b, e)))?;
                machines.push(machine);
            }
        }
        debug!(pairs = machines.len(), "solved one-vs-one machines");

        Ok(Self {
            machines,
            n_classes,
            kernel,
            penalty,
        })
    }

    /// Majority of pairwise votes; ties go to the lowest class code
    pub fn predict(&self, x: &Array2<f64>) -> Result<Vec<i32>> {
        let x_test = to_dense(x)?;
        let mut votes = vec![vec![0usize; self.n_classes]; x.nrows()];

        for machine in &self.machines {
            let problem = machine.borrow_owner();
            let decisions = machine
                .borrow_dependent()
                .predict(&x_test)
                .map_err(|e| NotebookError::Predict(format!("svm: {}", e)))?;
            for (row, d) in decisions.iter().enumerate() {
                let winner = if is_positive(d) { problem.positive } else { problem.negative };
                votes[row][winner as usize] += 1;
            }
        }

        Ok(votes
            .iter()
            .map(|row| {
                let mut best = 0;
                for (c, v) in row.iter().enumerate() {
                    if *v > row[best] {
                        best = c;
                    }
                }
                best as i32
            })
            .collect())
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn n_machines(&self) -> usize {
        self.machines.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "kernel: {:?}, C = {}, {} pairwise machines\n",
            self.kernel,
            self.penalty,
            self.machines.len()
        )
    }
}
