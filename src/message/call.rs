//! Service call model for invocations and notifications.

/// A service call parsed from an action name and positional arguments.
///
/// The wire carries the target as one dotted string; everything before the
/// *last* dot is the service name, the rest is the method. A name without a
/// dot addresses a method with no service qualifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceCall<V> {
    /// Qualifier before the last dot, absent when the name has none.
    pub service_name: Option<String>,
    /// Method name after the last dot (or the whole name).
    pub method_name: String,
    /// Positional arguments in wire order.
    pub arguments: Vec<V>,
}

impl<V> ServiceCall<V> {
    /// Split `action` at its last dot and attach `arguments`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chunkwire::message::ServiceCall;
    ///
    /// let call: ServiceCall<()> = ServiceCall::parse("com.foo.bar.doThing", Vec::new());
    /// assert_eq!(call.service_name.as_deref(), Some("com.foo.bar"));
    /// assert_eq!(call.method_name, "doThing");
    ///
    /// let bare: ServiceCall<()> = ServiceCall::parse("ping", Vec::new());
    /// assert!(bare.service_name.is_none());
    /// assert_eq!(bare.method_name, "ping");
    /// ```
    #[must_use]
    pub fn parse(action: &str, arguments: Vec<V>) -> Self {
        match action.rsplit_once('.') {
            Some((service, method)) => Self {
                service_name: Some(service.to_owned()),
                method_name: method.to_owned(),
                arguments,
            },
            None => Self {
                service_name: None,
                method_name: action.to_owned(),
                arguments,
            },
        }
    }

    /// Rebuild the dotted action name the wire expects.
    #[must_use]
    pub fn action(&self) -> String {
        match &self.service_name {
            Some(service) => format!("{service}.{}", self.method_name),
            None => self.method_name.clone(),
        }
    }
}

/// An invocation or notification as it appears on the wire.
///
/// Both kinds carry the same fields; what differs is the reply contract.
/// Inside [`Message::Invoke`](crate::message::Message::Invoke) the call is
/// pending — the peer expects a result message correlated by `invoke_id` —
/// while [`Message::Notify`](crate::message::Message::Notify) is complete as
/// soon as it is handled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandCall<V> {
    /// Correlation id for the eventual result (zero for notifications).
    pub invoke_id: u32,
    /// Connection parameter value sent before the positional arguments,
    /// when the payload carries one.
    pub connection_params: Option<V>,
    /// The parsed call target and arguments.
    pub call: ServiceCall<V>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::ServiceCall;

    #[rstest]
    #[case::qualified("com.foo.bar.doThing", Some("com.foo.bar"), "doThing")]
    #[case::single_level("echo.send", Some("echo"), "send")]
    #[case::unqualified("ping", None, "ping")]
    #[case::trailing_dot("service.", Some("service"), "")]
    fn action_names_split_on_the_last_dot(
        #[case] action: &str,
        #[case] service: Option<&str>,
        #[case] method: &str,
    ) {
        let call: ServiceCall<()> = ServiceCall::parse(action, Vec::new());
        assert_eq!(call.service_name.as_deref(), service);
        assert_eq!(call.method_name, method);
        assert_eq!(call.action(), action);
    }
}
