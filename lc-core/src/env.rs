use std::collections::BTreeMap;

use crate::prelude::*;

// How to (re)write a single environment variable
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EnvSetter {
    Value(String),
    FieldRef(String),
    Unset,
}

impl EnvSetter {
    pub fn value(v: impl Into<String>) -> EnvSetter {
        EnvSetter::Value(v.into())
    }

    fn apply(&self, env: &mut corev1::EnvVar) {
        match self {
            EnvSetter::Value(v) => {
                env.value = Some(v.clone());
                env.value_from = None;
            },
            EnvSetter::FieldRef(path) => {
                env.value = None;
                env.value_from = Some(corev1::EnvVarSource {
                    field_ref: Some(corev1::ObjectFieldSelector {
                        field_path: path.clone(),
                        ..Default::default()
                    }),
                    ..Default::default()
                });
            },
            EnvSetter::Unset => {
                env.value = None;
                env.value_from = None;
            },
        }
    }
}

// Applies the setters to an existing env var list (updating matching names in place, appending
// new ones) and returns the result sorted by name.
pub fn merge_envs(mut envs: Vec<corev1::EnvVar>, setters: &BTreeMap<String, EnvSetter>) -> Vec<corev1::EnvVar> {
    for (name, setter) in setters {
        match envs.iter_mut().find(|e| &e.name == name) {
            Some(env) => setter.apply(env),
            None => {
                let mut env = corev1::EnvVar { name: name.clone(), ..Default::default() };
                setter.apply(&mut env);
                envs.push(env);
            },
        }
    }

    envs.sort_by(|a, b| a.name.cmp(&b.name));
    envs
}
