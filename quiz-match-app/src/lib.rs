use std::sync::Arc;

use crate::{
    config::MatchConfig,
    domain::{
        account::BcryptCredentialService,
        rating::RatingServiceImpl,
        room::{RandomRoomKeyGenerator, RoomServiceImpl},
        seat::SeatServiceImpl,
        user::UserRepository,
    },
    ports::{authentication::AuthenticationPort, notification::ListenerNotificationPort},
    workflow::{
        account::{
            authenticate::{AuthenticateUseCase, AuthenticateUseCaseImpl},
            change_password::{ChangePasswordUseCase, ChangePasswordUseCaseImpl},
            profile::{GetUserDataUseCase, GetUserDataUseCaseImpl},
            session::{SessionUseCase, SessionUseCaseImpl},
            sign_in::{SignInUseCase, SignInUseCaseImpl},
            sign_up::{SignUpUseCase, SignUpUseCaseImpl},
        },
        gameplay::{
            end_set::{EndSetUseCase, EndSetUseCaseImpl},
            forfeit::ForfeitMatchWorkflowImpl,
            pairing::PairingWorkflowImpl,
            resolve::{ResolveMatchUseCase, ResolveMatchUseCaseImpl},
            score::{DisplayScoreUseCase, DisplayScoreUseCaseImpl},
            settle::SettleMatchWorkflowImpl,
            start_set::{StartSetUseCase, StartSetUseCaseImpl},
            submit::{SubmitAnswerUseCase, SubmitAnswerUseCaseImpl},
        },
        room::{
            create::{CreateRoomUseCase, CreateRoomUseCaseImpl},
            disconnect::{DisconnectUseCase, DisconnectUseCaseImpl},
            join::{JoinRoomUseCase, JoinRoomUseCaseImpl},
            leave::{LeaveRoomUseCase, LeaveRoomUseCaseImpl},
            query::{RoomQueryUseCase, RoomQueryUseCaseImpl},
        },
    },
};

pub mod config;
pub mod domain;
pub mod ports;
pub mod workflow;

#[cfg(test)]
pub mod testing;

pub struct Application {
    pub room_create_use_case: Box<dyn CreateRoomUseCase + Send + Sync + 'static>,
    pub room_join_use_case: Box<dyn JoinRoomUseCase + Send + Sync + 'static>,
    pub room_leave_use_case: Arc<dyn LeaveRoomUseCase + Send + Sync + 'static>,
    pub room_disconnect_use_case: Box<dyn DisconnectUseCase + Send + Sync + 'static>,
    pub room_query_use_case: Box<dyn RoomQueryUseCase + Send + Sync + 'static>,

    pub game_start_set_use_case: Box<dyn StartSetUseCase + Send + Sync + 'static>,
    pub game_submit_use_case: Box<dyn SubmitAnswerUseCase + Send + Sync + 'static>,
    pub game_end_set_use_case: Box<dyn EndSetUseCase + Send + Sync + 'static>,
    pub game_resolve_use_case: Box<dyn ResolveMatchUseCase + Send + Sync + 'static>,
    pub game_display_score_use_case: Box<dyn DisplayScoreUseCase + Send + Sync + 'static>,

    pub account_sign_up_use_case: Box<dyn SignUpUseCase + Send + Sync + 'static>,
    pub account_sign_in_use_case: Arc<dyn SignInUseCase + Send + Sync + 'static>,
    pub account_session_use_case: Box<dyn SessionUseCase + Send + Sync + 'static>,
    pub account_change_password_use_case: Box<dyn ChangePasswordUseCase + Send + Sync + 'static>,
    pub account_get_user_data_use_case: Box<dyn GetUserDataUseCase + Send + Sync + 'static>,
    pub account_authenticate_use_case: Box<dyn AuthenticateUseCase + Send + Sync + 'static>,
}

pub fn build_application<
    U: UserRepository + Send + Sync + 'static,
    L: ListenerNotificationPort + Send + Sync + 'static,
    A: AuthenticationPort + Send + Sync + 'static,
>(
    user_repository: Arc<U>,
    listener_notification_port: Arc<L>,
    authentication_port: Arc<A>,
    config: &MatchConfig,
) -> Application {
    let room_service = Arc::new(RoomServiceImpl::new(RandomRoomKeyGenerator, config));
    let seat_service = Arc::new(SeatServiceImpl::new(config));
    let rating_service = Arc::new(RatingServiceImpl::new(config));
    let credential_service = Arc::new(BcryptCredentialService::new(config));

    let settle_workflow = Arc::new(SettleMatchWorkflowImpl::new(
        user_repository.clone(),
        rating_service.clone(),
    ));
    let forfeit_workflow = Arc::new(ForfeitMatchWorkflowImpl::new(
        seat_service.clone(),
        settle_workflow.clone(),
        config,
    ));
    let pairing_workflow = Arc::new(PairingWorkflowImpl::new(
        user_repository.clone(),
        listener_notification_port.clone(),
        config,
    ));
    let leave_use_case = Arc::new(LeaveRoomUseCaseImpl::new(
        room_service.clone(),
        seat_service.clone(),
        forfeit_workflow,
        listener_notification_port.clone(),
    ));
    let sign_in_use_case = Arc::new(SignInUseCaseImpl::new(
        user_repository.clone(),
        authentication_port.clone(),
        credential_service.clone(),
    ));

    Application {
        room_create_use_case: Box::new(CreateRoomUseCaseImpl::new(
            room_service.clone(),
            seat_service.clone(),
        )),
        room_join_use_case: Box::new(JoinRoomUseCaseImpl::new(
            room_service.clone(),
            user_repository.clone(),
            pairing_workflow,
        )),
        room_disconnect_use_case: Box::new(DisconnectUseCaseImpl::new(
            leave_use_case.clone(),
            config,
        )),
        room_leave_use_case: leave_use_case,
        room_query_use_case: Box::new(RoomQueryUseCaseImpl::new(
            room_service.clone(),
            user_repository.clone(),
        )),

        game_start_set_use_case: Box::new(StartSetUseCaseImpl::new(
            room_service.clone(),
            seat_service.clone(),
            listener_notification_port.clone(),
            config,
        )),
        game_submit_use_case: Box::new(SubmitAnswerUseCaseImpl::new(
            room_service.clone(),
            seat_service.clone(),
            listener_notification_port.clone(),
            config,
        )),
        game_end_set_use_case: Box::new(EndSetUseCaseImpl::new(
            room_service.clone(),
            seat_service.clone(),
            listener_notification_port.clone(),
            config,
        )),
        game_resolve_use_case: Box::new(ResolveMatchUseCaseImpl::new(
            room_service.clone(),
            seat_service.clone(),
            settle_workflow,
            listener_notification_port.clone(),
            config,
        )),
        game_display_score_use_case: Box::new(DisplayScoreUseCaseImpl::new(
            room_service,
            seat_service,
        )),

        account_sign_up_use_case: Box::new(SignUpUseCaseImpl::new(
            user_repository.clone(),
            credential_service.clone(),
            sign_in_use_case.clone(),
            config,
        )),
        account_sign_in_use_case: sign_in_use_case,
        account_session_use_case: Box::new(SessionUseCaseImpl::new(
            user_repository.clone(),
            authentication_port.clone(),
            credential_service.clone(),
        )),
        account_change_password_use_case: Box::new(ChangePasswordUseCaseImpl::new(
            user_repository.clone(),
            credential_service,
        )),
        account_get_user_data_use_case: Box::new(GetUserDataUseCaseImpl::new(
            user_repository.clone(),
        )),
        account_authenticate_use_case: Box::new(AuthenticateUseCaseImpl::new(
            user_repository,
            authentication_port,
        )),
    }
}
