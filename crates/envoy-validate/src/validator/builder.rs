use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use prost_reflect::{FieldDescriptor, MessageDescriptor};

use envoy_validate_types::{FieldRules, MessageRules, RuleSet, Type};

use crate::error::CompilationError;

use super::evaluator::Evaluator;
use super::evaluator::embedded::EmbeddedMessageEval;
use super::evaluator::enum_check::DefinedEnumEval;
use super::evaluator::field::FieldEval;
use super::evaluator::list::ListEval;
use super::evaluator::map::MapEval;
use super::evaluator::message::MessageEval;
use super::evaluator::oneof::OneofEval;
use super::evaluator::value::ValueEval;
use super::lookups;
use super::rules;

/// Build-through cache of message evaluators keyed by descriptor full name.
pub(crate) struct Builder {
    /// Serializes cache writes.
    build_lock: Mutex<()>,
    /// Evaluator cache.
    cache: RwLock<HashMap<String, Arc<MessageEval>>>,
    /// Rule tables, keyed by message full name.
    rules: RuleSet,
    /// Whether unknown types can be lazily built.
    lazy: bool,
    /// Whether rule-table entries naming missing fields are ignored.
    allow_unknown_fields: bool,
}

impl Builder {
    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<MessageEval>>> {
        self.cache
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<MessageEval>>> {
        self.cache
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_build(&self) -> std::sync::MutexGuard<'_, ()> {
        self.build_lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn new(rules: RuleSet, lazy: bool, allow_unknown_fields: bool) -> Self {
        Self {
            build_lock: Mutex::new(()),
            cache: RwLock::new(HashMap::new()),
            rules,
            lazy,
            allow_unknown_fields,
        }
    }

    /// Load a cached evaluator or build a new one.
    pub fn load_or_build(&self, desc: &MessageDescriptor) -> Arc<MessageEval> {
        let key = desc.full_name().to_string();

        // Fast path
        {
            let cache = self.read_cache();
            if let Some(eval) = cache.get(&key) {
                return Arc::clone(eval);
            }
        }

        if !self.lazy {
            let eval = Arc::new(MessageEval::new());
            eval.set_err(CompilationError {
                cause: format!("no evaluator available for {key}"),
            });
            return eval;
        }

        // Slow path
        let _guard = self.lock_build();

        {
            let cache = self.read_cache();
            if let Some(eval) = cache.get(&key) {
                return Arc::clone(eval);
            }
        }

        let mut local_cache = self.read_cache().clone();
        let eval = self.build(desc, &mut local_cache);
        *self.write_cache() = local_cache;

        eval
    }

    /// Preload an evaluator into the cache, even when lazy compilation is disabled.
    pub fn preload(&self, desc: &MessageDescriptor) {
        let key = desc.full_name().to_string();
        if self.read_cache().contains_key(&key) {
            return;
        }

        let _guard = self.lock_build();
        if self.read_cache().contains_key(&key) {
            return;
        }

        let mut local_cache = self.read_cache().clone();
        let _ = self.build(desc, &mut local_cache);
        *self.write_cache() = local_cache;
    }

    /// Build an evaluator for a message descriptor.
    /// Recursive types are handled by inserting a placeholder Arc before recursing.
    fn build(
        &self,
        desc: &MessageDescriptor,
        cache: &mut HashMap<String, Arc<MessageEval>>,
    ) -> Arc<MessageEval> {
        let key = desc.full_name().to_string();

        if let Some(eval) = cache.get(&key) {
            return Arc::clone(eval);
        }

        let eval = Arc::new(MessageEval::new());
        cache.insert(key, Arc::clone(&eval));
        self.build_message(desc, &eval, cache);

        match eval.compilation_error_cause() {
            Some(cause) => tracing::warn!(
                message_type = desc.full_name(),
                %cause,
                "failed to compile validation rules"
            ),
            None => tracing::debug!(
                message_type = desc.full_name(),
                has_rules = self.rules.get(desc.full_name()).is_some(),
                "compiled validation rules"
            ),
        }

        eval
    }

    fn build_message(
        &self,
        desc: &MessageDescriptor,
        msg_eval: &Arc<MessageEval>,
        cache: &mut HashMap<String, Arc<MessageEval>>,
    ) {
        let default_rules = MessageRules::default();
        let msg_rules = self.rules.get(desc.full_name()).unwrap_or(&default_rules);

        if msg_rules.disabled {
            return;
        }

        if let Err(err) = self.check_field_names(desc, msg_rules) {
            msg_eval.set_err(err);
            return;
        }

        let oneof_evals = match Self::build_oneof_rules(desc, msg_rules) {
            Ok(evals) => evals,
            Err(err) => {
                msg_eval.set_err(err);
                return;
            }
        };
        self.process_fields(desc, msg_rules, msg_eval, cache);
        // Oneofs are checked after every field.
        for oneof_eval in oneof_evals {
            msg_eval.append(Box::new(oneof_eval));
        }
    }

    fn check_field_names(
        &self,
        desc: &MessageDescriptor,
        msg_rules: &MessageRules,
    ) -> Result<(), CompilationError> {
        if self.allow_unknown_fields {
            return Ok(());
        }

        match msg_rules
            .fields
            .keys()
            .find(|name| desc.get_field_by_name(name).is_none())
        {
            Some(name) => Err(CompilationError {
                cause: format!("field {name} not found in message {}", desc.full_name()),
            }),
            None => Ok(()),
        }
    }

    fn build_oneof_rules(
        desc: &MessageDescriptor,
        msg_rules: &MessageRules,
    ) -> Result<Vec<OneofEval>, CompilationError> {
        msg_rules
            .required_oneofs
            .iter()
            .map(|name| {
                desc.oneofs()
                    .find(|oneof| !oneof.is_synthetic() && oneof.name() == name)
                    .map(|descriptor| OneofEval {
                        descriptor,
                        required: true,
                    })
                    .ok_or_else(|| CompilationError {
                        cause: format!("oneof {name} not found in message {}", desc.full_name()),
                    })
            })
            .collect()
    }

    fn process_fields(
        &self,
        desc: &MessageDescriptor,
        msg_rules: &MessageRules,
        msg_eval: &Arc<MessageEval>,
        cache: &mut HashMap<String, Arc<MessageEval>>,
    ) {
        for field in desc.fields() {
            let fld_eval = self.build_field(&field, msg_rules.field(field.name()), cache);
            msg_eval.append(Box::new(fld_eval));
        }
    }

    fn build_field(
        &self,
        field_desc: &FieldDescriptor,
        field_rules: Option<&FieldRules>,
        cache: &mut HashMap<String, Arc<MessageEval>>,
    ) -> FieldEval {
        let default_rules = FieldRules::default();
        let effective_rules = field_rules.unwrap_or(&default_rules);
        let required = effective_rules.message.is_some_and(|m| m.required);

        let mut value_eval = ValueEval::new(field_desc.clone());
        let err = self
            .build_value(field_desc, effective_rules, &mut value_eval, cache, false)
            .err();

        FieldEval {
            value: value_eval,
            required,
            has_presence: field_desc.supports_presence(),
            err,
        }
    }

    fn build_value(
        &self,
        fdesc: &FieldDescriptor,
        field_rules: &FieldRules,
        val_eval: &mut ValueEval,
        cache: &mut HashMap<String, Arc<MessageEval>>,
        nested: bool,
    ) -> Result<(), CompilationError> {
        validate_rule_type_matches_field(fdesc, field_rules, nested)?;
        validate_message_rules(fdesc, field_rules, nested)?;
        validate_repeated_unique_rule_type(fdesc, field_rules, nested)?;
        Self::process_ignore_empty(fdesc, field_rules, val_eval, nested);
        self.process_embedded_message(fdesc, field_rules, val_eval, cache, nested)?;
        Self::process_standard_rules(field_rules, val_eval)?;
        Self::process_enum_rules(fdesc, field_rules, val_eval);
        self.process_map_rules(fdesc, field_rules, val_eval, cache, nested)?;
        self.process_repeated_rules(fdesc, field_rules, val_eval, cache, nested)?;
        Ok(())
    }

    fn process_ignore_empty(
        fdesc: &FieldDescriptor,
        field_rules: &FieldRules,
        val_eval: &mut ValueEval,
        nested: bool,
    ) {
        val_eval.ignore_empty = field_rules
            .r#type
            .as_ref()
            .is_some_and(lookups::ignores_empty);
        val_eval.zero = val_eval
            .ignore_empty
            .then(|| nested_zero_value(fdesc, nested));
    }

    fn process_embedded_message(
        &self,
        fdesc: &FieldDescriptor,
        field_rules: &FieldRules,
        val_eval: &mut ValueEval,
        cache: &mut HashMap<String, Arc<MessageEval>>,
        nested: bool,
    ) -> Result<(), CompilationError> {
        if !lookups::is_message_field(fdesc) || fdesc.is_map() || (fdesc.is_list() && !nested) {
            return Ok(());
        }
        if field_rules.message.is_some_and(|m| m.skip) {
            return Ok(());
        }

        let msg_desc = fdesc
            .kind()
            .as_message()
            .cloned()
            .ok_or_else(|| CompilationError {
                cause: format!("no message descriptor for field {}", fdesc.full_name()),
            })?;

        let embed_eval = self.build(&msg_desc, cache);
        if let Some(cause) = embed_eval.compilation_error_cause() {
            return Err(CompilationError {
                cause: format!(
                    "failed to compile embedded type {} for {}: {cause}",
                    msg_desc.full_name(),
                    fdesc.full_name(),
                ),
            });
        }
        val_eval.push_nested(Box::new(EmbeddedMessageEval {
            message: embed_eval,
        }));

        Ok(())
    }

    fn process_standard_rules(
        rules: &FieldRules,
        val_eval: &mut ValueEval,
    ) -> Result<(), CompilationError> {
        if let Some(eval) = rules::build_standard_rules(rules.r#type.as_ref())? {
            val_eval.push_rule(Box::new(eval));
        }
        Ok(())
    }

    fn process_enum_rules(fdesc: &FieldDescriptor, rules: &FieldRules, val_eval: &mut ValueEval) {
        let Some(enum_desc) = fdesc.kind().as_enum().cloned() else {
            return;
        };

        if let Some(Type::Enum(enum_rules)) = &rules.r#type {
            if enum_rules.defined_only {
                val_eval.push_rule(Box::new(DefinedEnumEval::new(&enum_desc)));
            }
        }
    }

    fn process_map_rules(
        &self,
        fdesc: &FieldDescriptor,
        rules: &FieldRules,
        val_eval: &mut ValueEval,
        cache: &mut HashMap<String, Arc<MessageEval>>,
        nested: bool,
    ) -> Result<(), CompilationError> {
        if !fdesc.is_map() || nested {
            return Ok(());
        }

        let map_entry = fdesc
            .kind()
            .as_message()
            .cloned()
            .ok_or_else(|| CompilationError {
                cause: format!("no map entry descriptor for field {}", fdesc.full_name()),
            })?;

        let key_desc = map_entry.map_entry_key_field();
        let value_desc = map_entry.map_entry_value_field();

        let map_rules = match &rules.r#type {
            Some(Type::Map(map_rules)) => Some(map_rules),
            _ => None,
        };
        let default_rules = FieldRules::default();

        let mut key_rules = ValueEval::new(key_desc.clone());
        let key_field_rules = map_rules
            .and_then(|m| m.keys.as_deref())
            .unwrap_or(&default_rules);
        self.build_value(&key_desc, key_field_rules, &mut key_rules, cache, true)?;

        let mut value_rules = ValueEval::new(value_desc.clone());
        let value_field_rules = map_rules
            .and_then(|m| m.values.as_deref())
            .unwrap_or(&default_rules);
        self.build_value(&value_desc, value_field_rules, &mut value_rules, cache, true)?;

        let map_eval = MapEval {
            key_rules,
            value_rules,
        };

        if !map_eval.tautology() {
            val_eval.push_nested(Box::new(map_eval));
        }

        Ok(())
    }

    fn process_repeated_rules(
        &self,
        fdesc: &FieldDescriptor,
        rules: &FieldRules,
        val_eval: &mut ValueEval,
        cache: &mut HashMap<String, Arc<MessageEval>>,
        nested: bool,
    ) -> Result<(), CompilationError> {
        if !fdesc.is_list() || nested {
            return Ok(());
        }

        let default_rules = FieldRules::default();
        let (item_field_rules, unique) = match &rules.r#type {
            Some(Type::Repeated(repeated)) => (repeated.items.as_deref(), repeated.unique),
            _ => (None, false),
        };
        let item_field_rules = item_field_rules.unwrap_or(&default_rules);

        let mut item_rules = ValueEval::new(fdesc.clone());
        self.build_value(fdesc, item_field_rules, &mut item_rules, cache, true)?;

        let list_eval = ListEval { item_rules, unique };
        if !list_eval.tautology() {
            val_eval.push_nested(Box::new(list_eval));
        }

        Ok(())
    }
}

fn nested_zero_value(fdesc: &FieldDescriptor, nested: bool) -> prost_reflect::Value {
    if nested && fdesc.is_list() {
        fdesc.kind().default_value()
    } else {
        fdesc.default_value()
    }
}

fn validate_rule_type_matches_field(
    field_desc: &FieldDescriptor,
    rules: &FieldRules,
    nested: bool,
) -> Result<(), CompilationError> {
    let Some(actual) = rules.r#type.as_ref().map(lookups::rule_name) else {
        return Ok(());
    };

    match lookups::expected_rule(field_desc, nested) {
        Some(expected) if expected == actual => Ok(()),
        Some(expected) => Err(CompilationError {
            cause: format!(
                "expected rule `{expected}`, got `{actual}` on field `{}`",
                field_desc.full_name()
            ),
        }),
        None => Err(CompilationError {
            cause: format!(
                "mismatched message rules, `{actual}` is not a valid rule for field `{}`",
                field_desc.full_name()
            ),
        }),
    }
}

fn validate_message_rules(
    field_desc: &FieldDescriptor,
    rules: &FieldRules,
    nested: bool,
) -> Result<(), CompilationError> {
    let Some(message_rules) = rules.message else {
        return Ok(());
    };
    if message_rules.is_empty() {
        return Ok(());
    }

    let singular_message =
        lookups::is_message_field(field_desc) && !field_desc.is_map() && (nested || !field_desc.is_list());
    if !singular_message {
        return Err(CompilationError {
            cause: format!(
                "message rules are only valid on message fields; `{}` is not one",
                field_desc.full_name()
            ),
        });
    }
    if nested && message_rules.required {
        return Err(CompilationError {
            cause: format!(
                "message.required is not supported on repeated items or map values of `{}`",
                field_desc.full_name()
            ),
        });
    }

    Ok(())
}

fn validate_repeated_unique_rule_type(
    field_desc: &FieldDescriptor,
    rules: &FieldRules,
    nested: bool,
) -> Result<(), CompilationError> {
    if nested {
        return Ok(());
    }

    let Some(Type::Repeated(repeated)) = &rules.r#type else {
        return Ok(());
    };

    if !repeated.unique {
        return Ok(());
    }

    if field_desc.kind().as_message().is_some() {
        return Err(CompilationError {
            cause: format!(
                "repeated.unique is only supported for scalar and enum item types; `{}` has message items",
                field_desc.full_name()
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use envoy_validate_types::{
        MapRules, MessageFieldRules, RepeatedRules, StringRules, Type,
    };

    use super::*;
    use crate::fixtures;

    fn builder(rules: RuleSet) -> Builder {
        Builder::new(rules, true, false)
    }

    #[test]
    fn nested_zero_value_uses_element_default_for_lists() {
        let field = fixtures::field("Cluster", "hosts");
        assert!(field.is_list());

        let top_level = nested_zero_value(&field, false);
        assert!(top_level.as_list().is_some());

        let nested = nested_zero_value(&field, true);
        assert_eq!(nested, field.kind().default_value());
        assert!(nested.as_str().is_some());
    }

    #[test]
    fn build_field_without_rules_still_builds_repeated_message_items() {
        let field = fixtures::field("Cluster", "endpoints");
        assert!(field.is_list());
        assert!(lookups::is_message_field(&field));

        let mut cache = HashMap::new();
        let eval = builder(RuleSet::new()).build_field(&field, None, &mut cache);

        assert!(eval.err.is_none());
        assert!(!eval.value.nested_rules.is_empty());
    }

    #[test]
    fn build_field_rejects_mismatched_rule_kind() {
        let field = fixtures::field("Cluster", "weight");
        let mut cache = HashMap::new();
        let rules = FieldRules::of(Type::String(StringRules::default()));

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        let err = eval.err.expect("string rules on an int32 field must not compile");
        assert_eq!(
            err.cause,
            "expected rule `int32`, got `string` on field `fixtures.v1.Cluster.weight`"
        );
    }

    #[test]
    fn build_field_rejects_map_rules_on_scalar_field() {
        let field = fixtures::field("Cluster", "name");
        let mut cache = HashMap::new();
        let rules = FieldRules::of(Type::Map(MapRules::default()));

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        assert!(eval.err.is_some());
    }

    #[test]
    fn build_field_rejects_type_rules_on_message_field() {
        let field = fixtures::field("Cluster", "endpoint");
        let mut cache = HashMap::new();
        let rules = FieldRules::of(Type::String(StringRules::default()));

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        let err = eval.err.expect("type rules on a message field must not compile");
        assert!(err.cause.starts_with("mismatched message rules"));
    }

    #[test]
    fn build_field_rejects_message_rules_on_scalar_field() {
        let field = fixtures::field("Cluster", "name");
        let mut cache = HashMap::new();
        let rules = FieldRules::message(MessageFieldRules {
            required: true,
            skip: false,
        });

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        assert!(eval.err.is_some_and(|e| e.cause.contains("only valid on message fields")));
    }

    #[test]
    fn build_field_rejects_repeated_unique_for_message_items() {
        let field = fixtures::field("Cluster", "endpoints");
        assert!(field.kind().as_message().is_some());

        let mut cache = HashMap::new();
        let rules = FieldRules::of(Type::Repeated(RepeatedRules {
            unique: true,
            ..Default::default()
        }));

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        let Some(err) = eval.err else {
            panic!("expected repeated.unique type mismatch");
        };
        assert!(err.cause.contains("repeated.unique is only supported"));
        assert!(err.cause.contains("fixtures.v1.Cluster.endpoints"));
    }

    #[test]
    fn skipped_message_fields_build_no_embedded_evaluator() {
        let field = fixtures::field("Cluster", "endpoint");
        let mut cache = HashMap::new();
        let rules = FieldRules::message(MessageFieldRules {
            skip: true,
            required: false,
        });

        let eval = builder(RuleSet::new()).build_field(&field, Some(&rules), &mut cache);
        assert!(eval.err.is_none());
        assert!(eval.value.nested_rules.is_empty());
    }

    #[test]
    fn unknown_fields_and_oneofs_fail_message_compilation() {
        let cluster = fixtures::cluster();
        let rules = RuleSet::new().with_message(
            cluster.full_name(),
            MessageRules::default().with_field("nope", FieldRules::default()),
        );
        let eval = builder(rules.clone()).load_or_build(&cluster);
        assert_eq!(
            eval.compilation_error_cause().as_deref(),
            Some("field nope not found in message fixtures.v1.Cluster")
        );

        let lenient = Builder::new(rules, true, true).load_or_build(&cluster);
        assert!(lenient.compilation_error_cause().is_none());

        let oneof_rules = RuleSet::new().with_message(
            cluster.full_name(),
            MessageRules {
                required_oneofs: vec!["missing".to_string()],
                ..Default::default()
            },
        );
        let eval = builder(oneof_rules).load_or_build(&cluster);
        assert!(
            eval.compilation_error_cause()
                .is_some_and(|cause| cause.contains("oneof missing not found"))
        );
    }

    #[test]
    fn disabled_messages_compile_to_nothing() {
        let cluster = fixtures::cluster();
        let rules = RuleSet::new().with_message(
            cluster.full_name(),
            MessageRules {
                disabled: true,
                ..Default::default()
            }
            .with_field("weight", FieldRules::of(Type::String(StringRules::default()))),
        );
        let eval = builder(rules).load_or_build(&cluster);
        assert!(eval.is_empty());
    }

    #[test]
    fn recursive_messages_reuse_the_cached_evaluator() {
        let cluster = fixtures::cluster();
        let builder = builder(RuleSet::new());
        let first = builder.load_or_build(&cluster);
        let second = builder.load_or_build(&cluster);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.compilation_error_cause().is_none());
    }

    #[test]
    fn eager_builder_only_knows_preloaded_messages() {
        let builder = Builder::new(RuleSet::new(), false, false);
        let endpoint = fixtures::endpoint();
        builder.preload(&endpoint);
        assert!(builder.load_or_build(&endpoint).compilation_error_cause().is_none());

        let cluster = fixtures::cluster();
        assert_eq!(
            builder.load_or_build(&cluster).compilation_error_cause().as_deref(),
            Some("no evaluator available for fixtures.v1.Cluster")
        );
    }

    #[test]
    fn process_embedded_message_surfaces_nested_compilation_errors() {
        let field = fixtures::field("Cluster", "endpoint");
        let nested_desc = fixtures::endpoint();
        let nested_eval = Arc::new(MessageEval::new());
        nested_eval.set_err(CompilationError {
            cause: "nested compile failure".to_string(),
        });

        let mut cache = HashMap::new();
        cache.insert(nested_desc.full_name().to_string(), nested_eval);

        let mut value_eval = ValueEval::new(field.clone());
        let err = builder(RuleSet::new())
            .process_embedded_message(
                &field,
                &FieldRules::default(),
                &mut value_eval,
                &mut cache,
                false,
            )
            .expect_err("nested compilation error should be surfaced");

        assert!(err.cause.contains("failed to compile embedded type"));
        assert!(err.cause.contains("fixtures.v1.Endpoint"));
        assert!(err.cause.contains("for fixtures.v1.Cluster.endpoint"));
        assert!(err.cause.contains("nested compile failure"));
    }
}
