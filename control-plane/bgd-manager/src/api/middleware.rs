use tower::ServiceBuilder;
use tower::layer::util::{Identity, Stack};
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    trace::TraceLayer,
};

pub fn create_middleware_stack() -> ServiceBuilder<
    Stack<TraceLayer<SharedClassifier<ServerErrorsAsFailures>>, Identity>,
> {
    ServiceBuilder::new().layer(TraceLayer::new_for_http())
}
