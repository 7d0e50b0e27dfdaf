//! # Call Path Scenarios
//!
//! Registry resolves, authority checks the permission bit, the validator
//! counts, and the gateway returns the implementation to dispatch to.

#[cfg(test)]
mod tests {
    use super::super::harness::{boot, boot_with, next_event, ADMIN};
    use ark_01_module_registry::{ModuleRegistryApi, RegistryError, RegistryOp};
    use ark_02_module_authority::{AuthorityError, ModuleAuthorityApi};
    use ark_03_access_validator::AccessValidatorApi;
    use kernel_runtime::{GatewayError, KernelConfig, PolicyKind};
    use shared_bus::{EventFilter, EventTopic, KernelEvent};
    use shared_types::entities::{Address, Keycode, RoleId, RuleId, Selector};

    const MODULE_IMPL: Address = Address::from_low_u16(0x1111);
    const ACCOUNT: Address = Address::from_low_u16(0x2222);
    const INTRUDER: Address = Address::from_low_u16(0x6666);

    fn module_a() -> Keycode {
        Keycode::from_leading_byte(0xA1)
    }

    fn selector() -> Selector {
        Selector::from_u32(0xdead_beef)
    }

    #[tokio::test]
    async fn test_register_grant_check_revoke_scenario() {
        let kernel = boot();
        let k = &kernel.container;

        k.registry.register(ADMIN, module_a(), MODULE_IMPL).await.unwrap();
        k.authority
            .grant_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();
        assert!(k.authority.check_permission(module_a(), ACCOUNT, selector()).await);

        k.authority
            .revoke_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();
        assert!(!k.authority.check_permission(module_a(), ACCOUNT, selector()).await);

        assert_eq!(
            k.authority
                .grant_permission(INTRUDER, module_a(), ACCOUNT, selector())
                .await,
            Err(AuthorityError::Unauthorized { caller: INTRUDER })
        );
    }

    #[tokio::test]
    async fn test_gateway_end_to_end() {
        let kernel = boot();
        let k = &kernel.container;

        assert!(matches!(
            k.gateway.authorize_call(ACCOUNT, module_a(), selector()).await,
            Err(GatewayError::Registry(RegistryError::NotRegistered(_)))
        ));

        k.registry.register(ADMIN, module_a(), MODULE_IMPL).await.unwrap();
        assert!(matches!(
            k.gateway.authorize_call(ACCOUNT, module_a(), selector()).await,
            Err(GatewayError::PermissionDenied { .. })
        ));

        k.authority
            .grant_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();
        assert_eq!(
            k.gateway.authorize_call(ACCOUNT, module_a(), selector()).await,
            Ok(MODULE_IMPL)
        );

        // Only the routed call reached the validator.
        assert_eq!(k.validator.validation_count().await, 1);
        assert_eq!(k.validator.validation_count_for(module_a(), selector()).await, 1);
    }

    #[tokio::test]
    async fn test_inactive_rules_do_not_block_calls() {
        let kernel = boot();
        let k = &kernel.container;
        k.registry.register(ADMIN, module_a(), MODULE_IMPL).await.unwrap();
        k.authority
            .grant_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();

        let rule = RuleId::of_name("DENY_ALL");
        k.validator
            .add_rule(ADMIN, module_a(), selector(), rule, u32::MAX)
            .await
            .unwrap();
        k.validator
            .set_rule_active(ADMIN, module_a(), selector(), rule, false)
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(
                k.gateway.authorize_call(ACCOUNT, module_a(), selector()).await,
                Ok(MODULE_IMPL)
            );
        }
        assert_eq!(k.validator.validation_count().await, 3);
    }

    #[tokio::test]
    async fn test_events_follow_commit_order() {
        let kernel = boot();
        let k = &kernel.container;
        let mut sub = kernel.subscribe(EventFilter::topics(vec![
            EventTopic::Registry,
            EventTopic::Authority,
        ]));

        k.registry.register(ADMIN, module_a(), MODULE_IMPL).await.unwrap();
        k.authority
            .grant_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();

        assert_eq!(
            next_event(&mut sub).await,
            KernelEvent::ModuleRegistered {
                keycode: module_a(),
                implementation: MODULE_IMPL
            }
        );
        assert_eq!(
            next_event(&mut sub).await,
            KernelEvent::PermissionGranted {
                module: module_a(),
                account: ACCOUNT,
                selector: selector()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_batch_is_invisible() {
        let kernel = boot();
        let k = &kernel.container;
        let module_b = Keycode::from_leading_byte(0xB2);
        let mut sub = kernel.subscribe(EventFilter::topics(vec![EventTopic::Registry]));

        let result = k
            .registry
            .execute_batch(
                ADMIN,
                vec![
                    RegistryOp::Register {
                        keycode: module_a(),
                        implementation: MODULE_IMPL,
                    },
                    RegistryOp::LinkDependency {
                        keycode: module_a(),
                        dependency: module_b,
                    },
                ],
            )
            .await;

        assert_eq!(result, Err(RegistryError::NotRegistered(module_b)));
        assert!(!k.registry.is_registered(module_a()).await);
        assert!(sub.drain().is_empty());
    }

    #[tokio::test]
    async fn test_roles_declared_from_config() {
        let mut config = KernelConfig::for_admin(ADMIN);
        config.roles.initial_roles = vec!["OPERATOR".to_string()];
        let kernel = boot_with(config);
        let k = &kernel.container;
        let operator = RoleId::of_name("OPERATOR");

        k.authority.grant_role(ADMIN, operator, ACCOUNT).await.unwrap();
        assert!(k.authority.has_role(operator, ACCOUNT).await);
        assert_eq!(
            k.authority
                .grant_role(ADMIN, RoleId::of_name("GHOST"), ACCOUNT)
                .await,
            Err(AuthorityError::InvalidRole(RoleId::of_name("GHOST")))
        );
    }

    #[tokio::test]
    async fn test_admin_set_policy_spans_subsystems() {
        let second = Address::from_low_u16(0xBE);
        let mut config = KernelConfig::for_admin(ADMIN);
        config.admin.admins.push(second);
        config.admin.policy = PolicyKind::AdminSet;
        let kernel = boot_with(config);
        let k = &kernel.container;

        k.registry.register(second, module_a(), MODULE_IMPL).await.unwrap();
        k.authority
            .grant_permission(ADMIN, module_a(), ACCOUNT, selector())
            .await
            .unwrap();
        assert_eq!(
            k.gateway.authorize_call(ACCOUNT, module_a(), selector()).await,
            Ok(MODULE_IMPL)
        );
    }
}
