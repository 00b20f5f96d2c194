//! Voting ensemble over independently trained probabilistic members.
//!
//! Members are evaluated from artifact parameters only; training happens
//! offline. The ensemble output is the soft average of member
//! distributions. Top-class ties break on the highest average confidence of
//! the members voting for each tied class, never on class ordinal.

use ndarray::{Array1, Array2};
use tracing::debug;

use crate::classifier::{
    check_artifact_schema, check_feature_width, softmax, DiseasePredictor, MemberVote, Prediction,
};
use crate::error::{TriageError, TriageResult};
use crate::features::FeatureVector;
use crate::model::{DecisionTree, LogisticBag, MemberParams, ModelArtifact, TreeNode};
use crate::types::{DiseaseClass, ProbabilityDistribution};

enum Member {
    Logistic {
        name: String,
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
    ShallowNetwork {
        name: String,
        hidden_weights: Array2<f64>,
        hidden_bias: Array1<f64>,
        output_weights: Array2<f64>,
        output_bias: Array1<f64>,
    },
    TreeEnsemble {
        name: String,
        trees: Vec<DecisionTree>,
    },
    KernelMachine {
        name: String,
        gamma: f64,
        support_vectors: Vec<Vec<f64>>,
        dual_coefs: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    BaggedLogistic {
        name: String,
        bags: Vec<LogisticBag>,
    },
}

impl Member {
    fn name(&self) -> &str {
        match self {
            Member::Logistic { name, .. }
            | Member::ShallowNetwork { name, .. }
            | Member::TreeEnsemble { name, .. }
            | Member::KernelMachine { name, .. }
            | Member::BaggedLogistic { name, .. } => name,
        }
    }
}

fn to_array2(matrix: &[Vec<f64>]) -> Array2<f64> {
    let rows = matrix.len();
    let cols = matrix.first().map_or(0, |r| r.len());
    Array2::from_shape_fn((rows, cols), |(i, j)| matrix[i][j])
}

pub struct VotingEnsemble {
    members: Vec<Member>,
    classes: Vec<DiseaseClass>,
    width: usize,
}

impl VotingEnsemble {
    pub fn from_artifact(artifact: &ModelArtifact) -> TriageResult<Self> {
        check_artifact_schema(artifact)?;
        let params = artifact.ensemble.as_ref().ok_or_else(|| {
            TriageError::ModelLoad(format!(
                "artifact {} carries no ensemble members",
                artifact.version
            ))
        })?;
        artifact.validate_internal()?;

        let members = params
            .members
            .iter()
            .map(|m| match m {
                MemberParams::Logistic { name, weights, bias } => Member::Logistic {
                    name: name.clone(),
                    weights: weights.clone(),
                    bias: bias.clone(),
                },
                MemberParams::ShallowNetwork {
                    name,
                    hidden_weights,
                    hidden_bias,
                    output_weights,
                    output_bias,
                } => Member::ShallowNetwork {
                    name: name.clone(),
                    hidden_weights: to_array2(hidden_weights),
                    hidden_bias: Array1::from_vec(hidden_bias.clone()),
                    output_weights: to_array2(output_weights),
                    output_bias: Array1::from_vec(output_bias.clone()),
                },
                MemberParams::TreeEnsemble { name, trees } => Member::TreeEnsemble {
                    name: name.clone(),
                    trees: trees.clone(),
                },
                MemberParams::KernelMachine {
                    name,
                    gamma,
                    support_vectors,
                    dual_coefs,
                    intercepts,
                } => Member::KernelMachine {
                    name: name.clone(),
                    gamma: *gamma,
                    support_vectors: support_vectors.clone(),
                    dual_coefs: dual_coefs.clone(),
                    intercepts: intercepts.clone(),
                },
                MemberParams::BaggedLogistic { name, bags } => Member::BaggedLogistic {
                    name: name.clone(),
                    bags: bags.clone(),
                },
            })
            .collect();

        Ok(Self {
            members,
            classes: artifact.classes.clone(),
            width: artifact.feature_schema.len(),
        })
    }

    fn member_probs(&self, member: &Member, x: &[f64]) -> TriageResult<Vec<f64>> {
        match member {
            Member::Logistic { weights, bias, .. } => Ok(logistic_probs(weights, bias, x)),
            Member::ShallowNetwork {
                hidden_weights,
                hidden_bias,
                output_weights,
                output_bias,
                ..
            } => {
                let input = Array1::from_vec(x.to_vec());
                let hidden = (hidden_weights.dot(&input) + hidden_bias)
                    .mapv(|v| v.max(0.0));
                let scores = output_weights.dot(&hidden) + output_bias;
                Ok(softmax(&scores.to_vec()))
            }
            Member::TreeEnsemble { name, trees, .. } => {
                let mut mean = vec![0.0; self.classes.len()];
                for tree in trees {
                    let leaf = walk_tree(name, tree, x)?;
                    let sum: f64 = leaf.iter().sum();
                    for (acc, &s) in mean.iter_mut().zip(leaf) {
                        *acc += if sum > 0.0 {
                            s / sum
                        } else {
                            1.0 / self.classes.len() as f64
                        };
                    }
                }
                mean.iter_mut().for_each(|v| *v /= trees.len() as f64);
                Ok(mean)
            }
            Member::KernelMachine {
                gamma,
                support_vectors,
                dual_coefs,
                intercepts,
                ..
            } => {
                let kernels: Vec<f64> = support_vectors
                    .iter()
                    .map(|sv| {
                        let dist2: f64 = sv
                            .iter()
                            .zip(x)
                            .map(|(a, b)| (a - b).powi(2))
                            .sum();
                        (-gamma * dist2).exp()
                    })
                    .collect();
                let scores: Vec<f64> = dual_coefs
                    .iter()
                    .zip(intercepts)
                    .map(|(coefs, intercept)| {
                        coefs.iter().zip(&kernels).map(|(c, k)| c * k).sum::<f64>() + intercept
                    })
                    .collect();
                Ok(softmax(&scores))
            }
            Member::BaggedLogistic { bags, .. } => {
                let mut mean = vec![0.0; self.classes.len()];
                for bag in bags {
                    let probs = logistic_probs(&bag.weights, &bag.bias, x);
                    for (acc, p) in mean.iter_mut().zip(probs) {
                        *acc += p;
                    }
                }
                mean.iter_mut().for_each(|v| *v /= bags.len() as f64);
                Ok(mean)
            }
        }
    }
}

fn logistic_probs(weights: &[Vec<f64>], bias: &[f64], x: &[f64]) -> Vec<f64> {
    let scores: Vec<f64> = weights
        .iter()
        .zip(bias)
        .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f64>() + b)
        .collect();
    softmax(&scores)
}

fn walk_tree<'a>(name: &str, tree: &'a DecisionTree, x: &[f64]) -> TriageResult<&'a [f64]> {
    let mut node = 0usize;
    for _ in 0..=tree.nodes.len() {
        match tree.nodes.get(node) {
            Some(TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            }) => {
                let value = x.get(*feature).copied().unwrap_or(0.0);
                node = if value <= *threshold { *left } else { *right };
            }
            Some(TreeNode::Leaf { scores }) => return Ok(scores),
            None => break,
        }
    }
    Err(TriageError::Prediction(format!(
        "member {name}: tree walk did not reach a leaf"
    )))
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Index of the winning class, breaking soft-average ties on the highest
/// average confidence of the members voting for each tied class.
fn resolve_winner(mean_probs: &[f64], member_probs: &[Vec<f64>]) -> usize {
    let top = argmax(mean_probs);
    let tied: Vec<usize> = mean_probs
        .iter()
        .enumerate()
        .filter(|(_, &p)| (mean_probs[top] - p).abs() < 1e-9)
        .map(|(i, _)| i)
        .collect();
    if tied.len() < 2 {
        return top;
    }

    let vote_confidence = |class: usize| -> f64 {
        let votes: Vec<f64> = member_probs
            .iter()
            .filter(|probs| argmax(probs) == class)
            .map(|probs| probs[class])
            .collect();
        if votes.is_empty() {
            0.0
        } else {
            votes.iter().sum::<f64>() / votes.len() as f64
        }
    };

    let mut winner = top;
    let mut best = vote_confidence(top);
    for &class in &tied {
        let confidence = vote_confidence(class);
        if confidence > best {
            best = confidence;
            winner = class;
        }
    }
    winner
}

impl DiseasePredictor for VotingEnsemble {
    fn name(&self) -> &str {
        "voting_ensemble"
    }

    fn predict(&self, features: &FeatureVector) -> TriageResult<Prediction> {
        check_feature_width(self.width, features)?;
        let x = features.values();

        let mut member_probs = Vec::with_capacity(self.members.len());
        let mut votes = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let probs = self.member_probs(member, x)?;
            let vote = argmax(&probs);
            votes.push(MemberVote {
                member: member.name().to_string(),
                vote: self.classes[vote],
                confidence: probs[vote],
            });
            member_probs.push(probs);
        }

        let mut mean = vec![0.0; self.classes.len()];
        for probs in &member_probs {
            for (acc, &p) in mean.iter_mut().zip(probs) {
                *acc += p;
            }
        }
        mean.iter_mut()
            .for_each(|v| *v /= self.members.len() as f64);

        // A tie-break winner gets an epsilon nudge so the distribution's
        // argmax stays aligned with the resolved vote.
        let winner = resolve_winner(&mean, &member_probs);
        mean[winner] += 1e-9;

        debug!(
            members = self.members.len(),
            winner = %self.classes[winner],
            "ensemble soft vote complete"
        );

        let distribution = ProbabilityDistribution::from_weights(
            self.classes.iter().copied().zip(mean.iter().copied()),
        )?;
        Ok(Prediction {
            distribution,
            member_votes: votes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureEngineer, FEATURE_COUNT};
    use crate::model::EnsembleParams;
    use symptom_nlp::{SymptomLexicon, SymptomParser};

    const ANOSMIA: usize = 10;
    const OCULAR: usize = 11;

    fn zeros(rows: usize, cols: usize) -> Vec<Vec<f64>> {
        vec![vec![0.0; cols]; rows]
    }

    /// Five-member artifact with weights that lean covid on anosmia and
    /// allergy on ocular pruritus.
    fn artifact() -> ModelArtifact {
        let mut logistic = zeros(5, FEATURE_COUNT);
        logistic[0][ANOSMIA] = 4.0;
        logistic[3][OCULAR] = 4.0;

        let mut hidden = zeros(4, FEATURE_COUNT);
        hidden[0][ANOSMIA] = 2.0;
        hidden[1][OCULAR] = 2.0;
        let mut output = zeros(5, 4);
        output[0][0] = 3.0;
        output[3][1] = 3.0;

        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature: ANOSMIA,
                    threshold: 0.35,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    scores: vec![0.1, 0.1, 0.1, 0.1, 0.6],
                },
                TreeNode::Leaf {
                    scores: vec![0.7, 0.1, 0.1, 0.05, 0.05],
                },
            ],
        };

        let mut sv_covid = vec![0.0; FEATURE_COUNT];
        sv_covid[ANOSMIA] = 0.8;
        let sv_none = vec![0.0; FEATURE_COUNT];

        let mut bag = zeros(5, FEATURE_COUNT);
        bag[0][ANOSMIA] = 3.0;

        ModelArtifact {
            version: "triage-ens-1".to_string(),
            feature_schema: crate::features::FEATURE_SCHEMA
                .iter()
                .map(|s| s.to_string())
                .collect(),
            classes: DiseaseClass::ALL.to_vec(),
            ensemble: Some(EnsembleParams {
                members: vec![
                    MemberParams::Logistic {
                        name: "logistic".to_string(),
                        weights: logistic,
                        bias: vec![0.0; 5],
                    },
                    MemberParams::ShallowNetwork {
                        name: "shallow_net".to_string(),
                        hidden_weights: hidden,
                        hidden_bias: vec![0.0; 4],
                        output_weights: output,
                        output_bias: vec![0.0; 5],
                    },
                    MemberParams::TreeEnsemble {
                        name: "trees".to_string(),
                        trees: vec![tree],
                    },
                    MemberParams::KernelMachine {
                        name: "kernel".to_string(),
                        gamma: 0.5,
                        support_vectors: vec![sv_covid, sv_none],
                        dual_coefs: vec![
                            vec![2.0, -1.0],
                            vec![0.0, 0.0],
                            vec![0.0, 0.0],
                            vec![0.0, 0.0],
                            vec![-1.0, 1.0],
                        ],
                        intercepts: vec![0.0; 5],
                    },
                    MemberParams::BaggedLogistic {
                        name: "bagged".to_string(),
                        bags: vec![
                            LogisticBag {
                                weights: bag.clone(),
                                bias: vec![0.0; 5],
                            },
                            LogisticBag {
                                weights: bag,
                                bias: vec![0.0; 5],
                            },
                        ],
                    },
                ],
            }),
            vision: None,
        }
    }

    fn features_for(text: &str) -> FeatureVector {
        let obs = SymptomParser::new(SymptomLexicon::turkish()).parse(text);
        FeatureEngineer::new().build(&obs)
    }

    #[test]
    fn every_member_votes_and_output_is_a_simplex() {
        let ensemble = VotingEnsemble::from_artifact(&artifact()).unwrap();
        let prediction = ensemble
            .predict(&features_for("koku alamıyorum ve nefes alamıyorum"))
            .unwrap();

        assert_eq!(prediction.member_votes.len(), 5);
        prediction.distribution.validate().unwrap();
    }

    #[test]
    fn anosmia_presentation_leans_covid() {
        let ensemble = VotingEnsemble::from_artifact(&artifact()).unwrap();
        let prediction = ensemble
            .predict(&features_for("koku alamıyorum"))
            .unwrap();
        let (disease, _) = prediction.distribution.argmax();
        assert_eq!(disease, DiseaseClass::Covid19);
    }

    #[test]
    fn ensemble_requires_members() {
        let artifact = ModelArtifact::builtin("v1");
        let err = VotingEnsemble::from_artifact(&artifact);
        assert!(matches!(err, Err(TriageError::ModelLoad(_))));
    }

    #[test]
    fn thirty_feature_artifact_is_rejected() {
        let mut thin = artifact();
        thin.feature_schema.truncate(30);
        let err = VotingEnsemble::from_artifact(&thin);
        assert!(matches!(err, Err(TriageError::SchemaMismatch(_))));
    }

    #[test]
    fn tie_breaks_on_average_vote_confidence_not_ordinal() {
        // Classes 0 and 1 tie in the soft average; class 1's voter is the
        // more confident one, so it must win despite the higher ordinal.
        let member_probs = vec![
            vec![0.7, 0.2, 0.1],
            vec![0.0, 0.9, 0.1],
            vec![0.4, 0.0, 0.6],
        ];
        let mut mean: Vec<f64> = vec![0.0; 3];
        for probs in &member_probs {
            for (acc, &p) in mean.iter_mut().zip(probs) {
                *acc += p;
            }
        }
        mean.iter_mut().for_each(|v| *v /= 3.0);
        assert!((mean[0] - mean[1]).abs() < 1e-12);

        assert_eq!(resolve_winner(&mean, &member_probs), 1);
    }

    #[test]
    fn malformed_tree_walk_is_an_error() {
        // A split that always routes back to itself never reaches a leaf.
        let tree = DecisionTree {
            nodes: vec![TreeNode::Split {
                feature: 0,
                threshold: 0.5,
                left: 0,
                right: 0,
            }],
        };
        let err = walk_tree("trees", &tree, &[0.0; FEATURE_COUNT]);
        assert!(matches!(err, Err(TriageError::Prediction(_))));
    }
}
